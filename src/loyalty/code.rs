// Coupon code generation
//
// Codes are human-enterable: a template prefix followed by random characters
// drawn from an alphabet without the ambiguous glyphs 0/O and 1/I.

use rand::Rng;

/// Characters usable in a generated code suffix. Excludes 0, O, 1 and I.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Default number of random characters appended after the prefix
pub const DEFAULT_SUFFIX_LEN: usize = 8;

/// Generate a coupon code as `{prefix}` + `suffix_len` random characters
pub fn generate_code(prefix: &str, suffix_len: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut code = String::with_capacity(prefix.len() + suffix_len);
    code.push_str(prefix);

    for _ in 0..suffix_len {
        let idx = rng.gen_range(0..CODE_ALPHABET.len());
        code.push(CODE_ALPHABET[idx] as char);
    }

    code
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Codes always have prefix length + suffix length characters from
        /// the unambiguous alphabet
        #[test]
        fn prop_code_shape(prefix in "[A-Z]{3,10}-", suffix_len in 1usize..=16) {
            let code = generate_code(&prefix, suffix_len);

            prop_assert_eq!(code.len(), prefix.len() + suffix_len);
            prop_assert!(code.starts_with(&prefix));

            for c in code[prefix.len()..].chars() {
                prop_assert!(CODE_ALPHABET.contains(&(c as u8)));
            }
        }
    }
}
