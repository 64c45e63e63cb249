use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures::stream;
use mime_streamer::*;
use std::io;
use tokio::io::AsyncReadExt;

fn build_message(boundary: &str, num_parts: usize, part_size: usize) -> Vec<u8> {
    let mut message = Vec::new();
    let line = "A".repeat(76);
    for i in 0..num_parts {
        message.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        message.extend_from_slice(format!("Content-ID: <part{}@bench>\r\n", i).as_bytes());
        message.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        let mut written = 0;
        while written < part_size {
            message.extend_from_slice(line.as_bytes());
            message.extend_from_slice(b"\r\n");
            written += line.len() + 2;
        }
    }
    message.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    message
}

fn discard_config(boundary: &str) -> StreamerConfig {
    StreamerConfig::new()
        .with_boundary(boundary)
        .unwrap()
        .leading_content(LeadingContent::Discard)
}

// Benchmark media type parsing
fn bench_parse_media_type(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_media_type");

    let test_cases = vec![
        ("simple", "text/html"),
        ("with_charset", "text/html; charset=utf-8"),
        (
            "xop",
            "multipart/related; type=\"application/xop+xml\"; start=\"<root@example.org>\"; boundary=\"MIME_boundary\"",
        ),
    ];

    for (name, input) in test_cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, &input| {
            b.iter(|| parse_media_type(black_box(input)));
        });
    }

    group.finish();
}

// Benchmark header block parsing
fn bench_header_parse(c: &mut Criterion) {
    let block = "Content-Type: application/xop+xml; charset=UTF-8; type=\"text/xml\"\r\n\
Content-Transfer-Encoding: 8bit\r\n\
Content-ID: <mymessage.xml@example.org>\r\n\
X-Folded: first\r\n\
\tsecond\r\n";

    c.bench_function("header_parse", |b| {
        b.iter(|| HeaderMap::parse(black_box(block)));
    });
}

// Benchmark walking every part of a message, draining each body
fn bench_streamer_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("streamer_drain");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for num_parts in [1, 5, 20].iter() {
        let message = build_message("bench-boundary", *num_parts, 16 * 1024);
        group.throughput(Throughput::Bytes(message.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(num_parts), &message, |b, message| {
            b.to_async(&rt).iter(|| async move {
                let mut streamer = MimeStreamer::with_config(
                    black_box(message.as_slice()),
                    discard_config("bench-boundary"),
                );
                let mut total = 0;
                while let Some(mut part) = streamer.next_part().await.unwrap() {
                    total += part.drain().await.unwrap();
                }
                total
            });
        });
    }

    group.finish();
}

// Benchmark reading part content through AsyncRead and through chunked pulls
fn bench_content_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_read");
    let rt = tokio::runtime::Runtime::new().unwrap();

    let message = build_message("bench-boundary", 1, 256 * 1024);
    let message = &message[..];
    group.throughput(Throughput::Bytes(message.len() as u64));

    group.bench_function("read_to_end", |b| {
        b.to_async(&rt).iter(|| async move {
            let mut streamer = MimeStreamer::with_config(message, discard_config("bench-boundary"));
            let mut part = streamer.get_next_part().await.unwrap();
            let mut body = Vec::new();
            part.read_to_end(&mut body).await.unwrap();
            body.len()
        });
    });

    for size in [512, 8192].iter() {
        group.bench_with_input(BenchmarkId::new("chunk", size), size, |b, &size| {
            b.to_async(&rt).iter(|| async move {
                let mut streamer =
                    MimeStreamer::with_config(message, discard_config("bench-boundary"));
                let mut part = streamer.get_next_part().await.unwrap();
                let mut total = 0;
                loop {
                    let chunk = part.content().chunk(size).await.unwrap();
                    if chunk.is_empty() {
                        break;
                    }
                    total += chunk.len();
                }
                total
            });
        });
    }

    group.finish();
}

// Benchmark a body arriving as a stream of small byte chunks
fn bench_from_body(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let message = build_message("http-boundary", 5, 8 * 1024);
    let chunks: Vec<Bytes> = message.chunks(1460).map(Bytes::copy_from_slice).collect();
    let chunks = &chunks;

    c.bench_function("from_body", |b| {
        b.to_async(&rt).iter(|| async move {
            let body = stream::iter(chunks.iter().cloned().map(Ok::<Bytes, io::Error>));
            let mut streamer =
                MimeStreamer::from_body("multipart/mixed; boundary=http-boundary", body).unwrap();
            let mut parts = 0;
            while streamer.next_part().await.unwrap().is_some() {
                parts += 1;
            }
            parts
        });
    });
}

criterion_group!(
    benches,
    bench_parse_media_type,
    bench_header_parse,
    bench_streamer_drain,
    bench_content_read,
    bench_from_body
);

criterion_main!(benches);
