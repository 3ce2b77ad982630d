#![no_main]
use impasse_cp::toy::ToyEncoder;
use impasse_cp::{BuildRequest, ImpossibleXorDifferentialModel};
use impasse_ir::Cipher;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(cipher) = Cipher::from_json_str(s) {
            // Use the cipher as its own inverse; only assembly is exercised.
            let inverse = cipher.clone();
            let model = ImpossibleXorDifferentialModel::new(cipher, inverse, ToyEncoder::text());
            if let Ok(built) = model.build(&BuildRequest::default()) {
                let _ = built.to_minizinc();
            }
        }
    }
});
