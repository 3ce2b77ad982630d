#![no_main]
use impasse_cp::rewrite::rewrite_text;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let (ids, text) = s.split_once('\n').unwrap_or((s, s));
        let ids: Vec<&str> = ids
            .split(',')
            .filter(|id| !id.is_empty() && !id.contains("inverse_"))
            .filter(|id| id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
            .collect();
        let once = rewrite_text(text, ids.as_slice());
        assert!(!once.contains("inverse_inverse_"));
        assert_eq!(rewrite_text(&once, ids.as_slice()), once);
    }
});
