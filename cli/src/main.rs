mod audio;

use chrono::Local;
use clap::{Parser, Subcommand};
use hound::WavSpec;
use std::fs::File;
use std::io::BufRead;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use audio::{CpalInput, CpalOutput};
use tonechat_core::{
    frame_waveform, AudioInput, AudioOutput, ChatConfig, ChatNode, Demodulator,
    DEMOD_TRIGGER_SYMBOLS, READ_CHUNK_SAMPLES, SAMPLES_PER_SYMBOL, SAMPLE_RATE,
};

/// Longest sender name accepted from the command line
const MAX_USERNAME_BYTES: usize = 16;

/// Longest message accepted from the command line
const MAX_MESSAGE_BYTES: usize = 64;

#[derive(Parser)]
#[command(name = "tonechat")]
#[command(about = "Chat over near-ultrasonic tones between nearby devices")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat through the default mic and speaker
    Chat {
        /// Name shown to other participants
        #[arg(short, long)]
        name: String,
    },

    /// Print every frame heard on the default mic
    Listen {
        /// Name used to drop your own frames
        #[arg(short, long)]
        name: String,
    },

    /// Play a single message through the default speaker and exit
    Send {
        /// Name shown to other participants
        #[arg(short, long)]
        name: String,

        /// Message text
        #[arg(value_name = "MESSAGE")]
        message: String,
    },

    /// Encode a message to a WAV audio file
    Encode {
        /// Name shown to other participants
        #[arg(short, long)]
        name: String,

        /// Message text
        #[arg(value_name = "MESSAGE")]
        message: String,

        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,
    },

    /// Decode the first chat frame found in a WAV audio file
    Decode {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { name } => chat_command(&name)?,
        Commands::Listen { name } => listen_command(&name)?,
        Commands::Send { name, message } => send_command(&name, &message)?,
        Commands::Encode { name, message, output } => encode_command(&name, &message, &output)?,
        Commands::Decode { input } => decode_command(&input)?,
    }

    Ok(())
}

/// Truncate to a byte budget without splitting a UTF-8 character
fn truncate_to_bytes(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

fn chat_command(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let username = truncate_to_bytes(name.trim(), MAX_USERNAME_BYTES).to_string();

    let input = CpalInput::open()?;
    let output = CpalOutput::open()?;

    let (mut node, frames) = ChatNode::start(ChatConfig::new(&username), input, output)?;
    println!("Chatting as {}. Type a message and press enter; ctrl-d quits.", username);

    let printer = thread::spawn(move || {
        for frame in frames {
            println!("[{}] {}: {}", timestamp(), frame.sender, frame.message);
        }
    });

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let message = truncate_to_bytes(line.trim(), MAX_MESSAGE_BYTES);
        if message.is_empty() {
            continue;
        }
        node.send_message(message);
        println!("[{}] {}: {}", timestamp(), username, message);
    }

    node.stop();
    let _ = printer.join();
    Ok(())
}

fn listen_command(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let username = truncate_to_bytes(name.trim(), MAX_USERNAME_BYTES).to_string();

    let mut input = CpalInput::open()?;
    let mut demodulator = Demodulator::new();
    let mut chunk = [0i16; READ_CHUNK_SAMPLES];

    println!("Listening as {}. Ctrl-c quits.", username);

    loop {
        let count = input.read(&mut chunk)?;
        if count == 0 {
            continue;
        }
        if let Some(frame) = demodulator.push_i16(&chunk[..count]) {
            if frame.sender == username {
                continue;
            }
            println!("[{}] {}: {}", timestamp(), frame.sender, frame.message);
        }
    }
}

fn send_command(name: &str, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let username = truncate_to_bytes(name.trim(), MAX_USERNAME_BYTES);
    let message = truncate_to_bytes(message.trim(), MAX_MESSAGE_BYTES);

    let samples = frame_waveform(username, message)?;
    println!("Playing {} samples as {}", samples.len(), username);

    let mut output = CpalOutput::open()?;
    output.write(&samples)?;

    // The device buffer may still hold the frame tail when write returns
    thread::sleep(Duration::from_millis(200));

    println!("Sent: {}", message);
    Ok(())
}

fn encode_command(
    name: &str,
    message: &str,
    output_path: &PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let username = truncate_to_bytes(name.trim(), MAX_USERNAME_BYTES);
    let message = truncate_to_bytes(message.trim(), MAX_MESSAGE_BYTES);

    let samples = frame_waveform(username, message)?;
    println!("Encoded to {} audio samples", samples.len());

    // 16-bit mono PCM at the modem rate
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let file = File::create(output_path)?;
    let mut writer = hound::WavWriter::new(file, spec)?;
    for sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    println!("Wrote frame from {} to {}", username, output_path.display());
    Ok(())
}

fn decode_command(input_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(input_path)?;
    let mut reader = hound::WavReader::new(file)?;

    let spec = reader.spec();
    println!(
        "Read WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    // Extract samples (handle both 16-bit and 32-bit float formats)
    let samples: Vec<f32> = match spec.bits_per_sample {
        16 => {
            let int_samples: Result<Vec<i16>, _> = reader.samples::<i16>().collect();
            int_samples?
                .into_iter()
                .map(|s| s as f32 / 32768.0)
                .collect()
        }
        32 => {
            let float_samples: Result<Vec<f32>, _> = reader.samples::<f32>().collect();
            float_samples?
        }
        _ => {
            return Err(format!("Unsupported bit depth: {}", spec.bits_per_sample).into());
        }
    };

    println!("Extracted {} samples", samples.len());

    let mut demodulator = Demodulator::new();
    let mut decoded = None;
    for chunk in samples.chunks(READ_CHUNK_SAMPLES) {
        if let Some(frame) = demodulator.push_normalized(chunk) {
            decoded = Some(frame);
            break;
        }
    }

    // A frame near the end of the file may still sit below the scan
    // trigger, so pad with silence until the buffer crosses it once more
    if decoded.is_none() {
        let silence = vec![0.0f32; READ_CHUNK_SAMPLES];
        let flush_chunks = DEMOD_TRIGGER_SYMBOLS * SAMPLES_PER_SYMBOL / READ_CHUNK_SAMPLES + 1;
        for _ in 0..flush_chunks {
            if let Some(frame) = demodulator.push_normalized(&silence) {
                decoded = Some(frame);
                break;
            }
        }
    }

    match decoded {
        Some(frame) => println!("{}: {}", frame.sender, frame.message),
        None => println!("No chat frame found"),
    }

    Ok(())
}
