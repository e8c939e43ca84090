// demos/network_simulation.rs
//! Simulates network packet handling with pooled streams.

use recyclemem::prelude::*;
use std::io::{Seek, SeekFrom, Write};
use std::time::Instant;

fn main() -> Result<()> {
    println!("=== Network Packet Simulation ===\n");

    let manager = MemoryStreamManager::new(16384, 1_048_576, 8_388_608)?;
    let num_packets = 10_000;
    let start = Instant::now();

    for i in 0..num_packets {
        let mut packet = manager.get_stream("packet", 1500, false);

        // Header: sequence number, payload length.
        packet.write_all(&(i as u32).to_be_bytes())?;
        packet.write_all(&1400u32.to_be_bytes())?;

        let payload = vec![0x42u8; 1400];
        packet.write_all(&payload)?;

        // Process the packet (simulated by re-reading the header).
        packet.seek(SeekFrom::Start(0))?;
        let mut seq_bytes = [0u8; 4];
        let mut len_bytes = [0u8; 4];
        std::io::Read::read_exact(&mut packet, &mut seq_bytes)?;
        std::io::Read::read_exact(&mut packet, &mut len_bytes)?;
        let seq = u32::from_be_bytes(seq_bytes);
        let len = u32::from_be_bytes(len_bytes);

        if i % 1000 == 0 {
            println!("Processed packet {} (seq={}, len={})", i, seq, len);
        }

        packet.close(); // Returns its block to the pool immediately.
    }

    let elapsed = start.elapsed();
    println!("\nProcessed {} packets in {:?}", num_packets, elapsed);
    println!(
        "Average: {:.2} µs per packet",
        elapsed.as_micros() as f64 / num_packets as f64
    );

    println!("\nPool occupancy after run:");
    println!("  Small blocks free: {}", manager.small_blocks_free());
    println!("  Large buffers free: {}", manager.large_buffers_free());

    // Compare against allocating a fresh, unpooled manager per packet —
    // every stream's block is returned to that manager's pool on drop
    // and then discarded along with the manager itself.
    println!("\n=== Non-Pooled Comparison ===\n");
    let start = Instant::now();

    for i in 0..num_packets {
        let throwaway = MemoryStreamManager::new(16384, 1_048_576, 8_388_608)?;
        let mut packet = throwaway.get_stream("packet", 1500, false);
        packet.write_all(&(i as u32).to_be_bytes())?;
        packet.write_all(&1400u32.to_be_bytes())?;
        let payload = vec![0x42u8; 1400];
        packet.write_all(&payload)?;
    }

    let elapsed_no_pool = start.elapsed();
    println!("Non-pooled time: {:?}", elapsed_no_pool);
    println!(
        "Speedup: {:.2}x faster with a shared pool",
        elapsed_no_pool.as_secs_f64() / elapsed.as_secs_f64()
    );

    Ok(())
}
