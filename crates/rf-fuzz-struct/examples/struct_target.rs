//! Structured target demo: fuzzes a toy packet parser.
//!
//! Seeds two hand-written packets, lets the runner mutate and generate more,
//! and prints the text report. The parser panics on one narrow input region
//! (a fragmented packet claiming an empty payload) so the report has
//! something to show.
//!
//! Run with `RUST_LOG=info cargo run --example struct_target`.

use anyhow::Result;
use rf_fuzz_struct::{
    FuzzConfig, FuzzContext, FuzzReport, FuzzRunner, debug_tree, encode, fuzz_record,
};

fuzz_record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Header {
        pub version: u8,
        pub fragmented: bool,
        pub route: Option<String>,
    }
}

fuzz_record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Packet {
        pub header: Option<Header>,
        pub sequence: u32,
        pub payload: Vec<u8>,
        #[allow(dead_code)]
        checksum: u16,
    }
}

/// The code under test
fn parse(ctx: &mut FuzzContext, packet: Packet) {
    let Some(header) = packet.header else {
        return;
    };

    if header.version > 3 {
        ctx.error(format!("unknown version {}", header.version));
        return;
    }

    if header.fragmented {
        // Bug: fragments are assumed to carry at least one byte
        let first = packet.payload[0];
        ctx.log(format!("fragment starts with {first:#04x}"));
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seeds = [
        Packet {
            header: Some(Header {
                version: 1,
                fragmented: false,
                route: Some("a/b".into()),
            }),
            sequence: 7,
            payload: b"hello".to_vec(),
            checksum: 0,
        },
        Packet {
            header: Some(Header {
                version: 2,
                fragmented: true,
                route: None,
            }),
            sequence: 8,
            payload: vec![0xff],
            checksum: 0,
        },
    ];

    println!("{}", debug_tree(&seeds[1])?);
    println!("seed scalars: {:?}\n", encode(&seeds[1])?);

    let config = FuzzConfig::ci().with_seed(0x5eed).with_max_len(8);
    let mut runner = FuzzRunner::new(config);
    for seed in &seeds {
        runner.add(seed)?;
    }

    // Panics are reported, not fatal; keep the default hook quiet
    std::panic::set_hook(Box::new(|_| {}));
    let result = runner.fuzz(parse)?;
    let _ = std::panic::take_hook();

    let mut report = FuzzReport::new("Packet parser");
    report.add_result(result);
    println!("{}", report.to_text());

    std::process::exit(if report.all_passed() { 0 } else { 1 });
}
