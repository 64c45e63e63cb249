#![no_main]

use libfuzzer_sys::fuzz_target;
use mime_streamer::{LeadingContent, MimeStreamer, StreamerConfig};
use tokio::io::AsyncReadExt;
use tokio::runtime::Builder;

fuzz_target!(|data: &[u8]| {
    let rt = Builder::new_current_thread().build().unwrap();

    rt.block_on(async {
        // Discovered boundary
        let mut streamer = MimeStreamer::new(data);
        for _ in 0..100 {
            match streamer.next_part().await {
                Ok(Some(mut part)) => {
                    let mut body = Vec::new();
                    let _ = (&mut part).take(1024 * 1024).read_to_end(&mut body).await;
                }
                Ok(None) | Err(_) => break,
            }
        }

        // Known boundary, bodies left for the streamer to drain
        let config = StreamerConfig::new()
            .with_boundary("boundary")
            .unwrap()
            .leading_content(LeadingContent::Discard);
        let mut streamer = MimeStreamer::with_config(data, config);
        for _ in 0..100 {
            match streamer.next_part().await {
                Ok(Some(_part)) => {}
                Ok(None) | Err(_) => break,
            }
        }
    });
});
