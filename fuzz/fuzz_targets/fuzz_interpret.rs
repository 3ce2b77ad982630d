#![no_main]
use impasse_cp::toy::{toy_cipher, toy_inverse_cipher, ToyEncoder};
use impasse_cp::{BuildRequest, ImpossibleXorDifferentialModel, ModelType};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let model =
            ImpossibleXorDifferentialModel::new(toy_cipher(), toy_inverse_cipher(), ToyEncoder::text());
        if let Ok(built) = model.build(&BuildRequest::default()) {
            let lines: Vec<&str> = s.lines().collect();
            // Arbitrary solver output must never panic the interpreter.
            let _ = model.parse_solver_output(
                &built.layout,
                lines.as_slice(),
                ModelType::ImpossibleXorDifferential,
            );
        }
    }
});
