use serial_framer::{stage, Bench, Checksummed, Config, LinkTiming, DEFAULT_BYTES};

const MAX_TICKS: u64 = 4_000_000;

fn main() {
    let mut bench = Bench::<_, DEFAULT_BYTES, DEFAULT_BYTES>::new(
        Checksummed::new(stage::identity::<DEFAULT_BYTES>()),
        LinkTiming::NOMINAL,
        Config::DEFAULT,
    );

    let mut payload = [0u8; DEFAULT_BYTES];
    for (i, b) in payload.iter_mut().enumerate() {
        *b = (i as u8).wrapping_mul(7).wrapping_add(3);
    }

    match bench.transact(&payload, MAX_TICKS) {
        Ok(out) => {
            for row in out.chunks(16) {
                let line: Vec<String> = row.iter().map(|b| format!("{:02x}", b)).collect();
                println!("{}", line.join(" "));
            }
            println!("ticks: {}", bench.ticks());
            println!("status: {:04x}", bench.core().debug_word());
            println!("echoed: {}", out.as_slice() == &payload[..]);
        }
        Err(e) => {
            eprintln!("transaction failed: {:?}", e);
            std::process::exit(1);
        }
    }
}
