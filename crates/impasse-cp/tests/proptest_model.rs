//! Property-based tests for model assembly over generated ciphers.

use impasse_cp::terms::INVERSE_MARKER;
use impasse_cp::toy::ToyEncoder;
use impasse_cp::{BuildRequest, ImpossibleXorDifferentialModel};
use impasse_ir::proptest_generators::arb_toy_cipher;
use impasse_ir::Cipher;
use proptest::prelude::*;

fn cipher_and_middle_round() -> impl Strategy<Value = (Cipher, usize)> {
    arb_toy_cipher().prop_flat_map(|cipher| {
        let rounds = cipher.number_of_rounds();
        (Just(cipher), 1..=rounds)
    })
}

proptest! {
    #[test]
    fn generated_ciphers_assemble_cleanly((cipher, middle_round) in cipher_and_middle_round()) {
        // A structural inverse with the same ids stresses namespace separation.
        let inverse = cipher.clone();
        let model = ImpossibleXorDifferentialModel::new(cipher, inverse, ToyEncoder::text());
        let built = model
            .build(&BuildRequest::default().with_middle_round(middle_round))
            .unwrap();
        let text = built.to_minizinc();

        prop_assert!(built.is_complete());
        prop_assert!(text.contains("constraint count(plaintext, 1) > 0;"));
        prop_assert!(!text.contains("inverse_inverse_"));
        for (pos, _) in text.match_indices(INVERSE_MARKER) {
            let previous = text[..pos].chars().next_back();
            prop_assert!(
                !previous.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_'),
                "marker inside an identifier"
            );
        }
    }

    #[test]
    fn text_and_structured_encoders_agree_on_declarations(
        (cipher, middle_round) in cipher_and_middle_round()
    ) {
        let request = BuildRequest::default().with_middle_round(middle_round);
        let text = ImpossibleXorDifferentialModel::new(cipher.clone(), cipher.clone(), ToyEncoder::text())
            .build(&request)
            .unwrap();
        let structured = ImpossibleXorDifferentialModel::new(cipher.clone(), cipher, ToyEncoder::structured())
            .build(&request)
            .unwrap();
        prop_assert_eq!(text.declared_names(), structured.declared_names());
    }
}
