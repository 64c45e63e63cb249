#![no_main]

use libfuzzer_sys::fuzz_target;
use mime_streamer::parse_media_type;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok((media_type, params)) = parse_media_type(s) {
            assert_eq!(media_type, media_type.to_ascii_lowercase());
            assert!(params.keys().all(|k| *k == k.to_ascii_lowercase()));
        }
    }
});
