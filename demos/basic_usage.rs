// demos/basic_usage.rs
//! Basic usage example of the pool manager and stream view.

use recyclemem::prelude::*;
use std::io::{Read, Seek, SeekFrom, Write};

fn main() -> Result<()> {
    println!("=== Pool Manager Basics ===\n");

    let manager = MemoryStreamManager::new(16384, 1_048_576, 8_388_608)?;
    println!(
        "Manager geometry: block_size={}, large_buffer_multiple={}, maximum_buffer_size={}",
        manager.geometry().block_size,
        manager.geometry().large_buffer_multiple,
        manager.geometry().maximum_buffer_size
    );

    println!("\n=== Stream Write/Read ===\n");

    let mut stream = manager.get_stream("basic-usage", 0, false);
    stream.write_all(b"Hello, World!")?;
    println!("Stream length: {}", stream.len());
    println!("Stream position: {}", stream.position());

    stream.seek(SeekFrom::Start(0))?;
    let mut out = vec![0u8; 13];
    stream.read_exact(&mut out)?;
    println!("Read back: {:?}", String::from_utf8_lossy(&out));

    println!("\n=== Promotion to a Large Buffer ===\n");

    let mut big = manager.get_stream("promotion-demo", 0, false);
    let payload = vec![0xABu8; 20_000];
    big.write_all(&payload)?;
    println!("Capacity before get_buffer: {}", big.capacity());
    let view = big.get_buffer()?;
    println!(
        "Capacity after get_buffer (promoted): {} (view len {})",
        big.capacity(),
        view.len()
    );
    big.close();

    println!("\n=== Pool Occupancy ===\n");

    println!(
        "Small blocks free: {}, large buffers free: {}",
        manager.small_blocks_free(),
        manager.large_buffers_free()
    );
    drop(stream);
    println!(
        "After dropping the first stream: small blocks free: {}",
        manager.small_blocks_free()
    );

    Ok(())
}
