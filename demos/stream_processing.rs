// demos/stream_processing.rs
//! Demonstrates streaming data processing with a recyclable memory stream.

use recyclemem::prelude::*;
use std::io::{Read, Seek, SeekFrom, Write};

fn main() -> Result<()> {
    println!("=== Stream Processing Example ===\n");

    let manager = MemoryStreamManager::new(16384, 1_048_576, 8_388_608)?;
    let mut stream = manager.get_stream("chunked", 0, false);

    let chunks: Vec<&[u8]> = vec![
        b"This is the first chunk of streaming data. ",
        b"Here comes the second chunk with more information. ",
        b"And finally, the third chunk to complete the message.",
    ];

    println!("Writing chunks to stream...");
    for (i, chunk) in chunks.iter().enumerate() {
        stream.write_all(chunk)?;
        println!(
            "Chunk {}: wrote {} bytes (length: {}, capacity: {})",
            i + 1,
            chunk.len(),
            stream.len(),
            stream.capacity()
        );
    }

    println!("\nReading stream in 50-byte chunks:");
    stream.seek(SeekFrom::Start(0))?;
    let mut chunk_num = 1;
    let mut total_read = 0usize;
    loop {
        let mut output = vec![0u8; 50];
        let read = stream.read(&mut output)?;
        if read == 0 {
            break;
        }
        output.truncate(read);
        println!("Chunk {}: {:?}", chunk_num, String::from_utf8_lossy(&output));
        total_read += read;
        chunk_num += 1;
    }
    println!("\nTotal read: {} bytes", total_read);

    // Promotion to a single contiguous buffer.
    println!("\n=== Promotion to a Contiguous Buffer ===\n");
    let view = stream.get_buffer()?;
    println!(
        "Contiguous view of {} logical bytes (backing capacity {})",
        stream.len(),
        view.len()
    );
    stream.close();

    // Event sink observing pool lifecycle events.
    println!("\n=== Event Sink Demonstration ===\n");
    let observed = MemoryStreamManager::new(16384, 1_048_576, 8_388_608)?
        .with_event_sink(TracingEventSink);
    {
        let mut s = observed.get_stream("observed", 0, false);
        s.write_all(b"hello, events")?;
        // Disposed explicitly below; dropping without `close()` would emit
        // StreamFinalizedWithoutDispose instead.
        s.close();
    }
    println!("See tracing output above for StreamCreated/StreamDisposed events.");

    // Seeking past the logical end leaves a zero-filled gap.
    println!("\n=== Seek-Past-End Gap ===\n");
    let mut gapped = manager.get_stream("gapped", 0, false);
    gapped.seek(SeekFrom::Start(100))?;
    gapped.write_all(b"tail")?;
    let mut all = vec![0u8; gapped.len() as usize];
    gapped.seek(SeekFrom::Start(0))?;
    gapped.read_exact(&mut all)?;
    println!("Length: {}, leading gap is zero: {}", gapped.len(), all[..100].iter().all(|&b| b == 0));

    Ok(())
}
