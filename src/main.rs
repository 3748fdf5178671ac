use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use rsa_oaep::rsa::{HashAlgorithm, KeyGenerator, RsaConfig, MIN_KEY_LENGTH};

/// Times RSA-OAEP encode/decode and sign/verify round trips
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Modulus size in bits
    #[arg(long, default_value_t = MIN_KEY_LENGTH)]
    bits: u64,

    /// Number of round trips to run
    #[arg(long, default_value_t = 10)]
    trials: usize,

    /// Hash algorithm for padding and signatures
    #[arg(long, default_value = "SHA-512")]
    hash: String,

    /// Message to encrypt and sign
    #[arg(long, default_value = "Hello World!")]
    message: String,
}

struct Tally {
    success: usize,
    failed: usize,
}

fn run(args: &Args) -> Result<Tally> {
    let algorithm = HashAlgorithm::from_name(&args.hash)?;
    let config = RsaConfig::default().with_algorithm(algorithm);

    let start = Instant::now();
    let mut generator = KeyGenerator::from_entropy(config)?;
    let keypair = generator
        .generate(args.bits)
        .with_context(|| format!("generating a {}-bit keypair", args.bits))?;
    println!("Key length: {} bits ({:?})", keypair.bit_length(), start.elapsed());

    let public_key = keypair.public_key();
    let private_key = keypair.private_key();
    let message = args.message.as_bytes();
    let mut tally = Tally { success: 0, failed: 0 };

    for trial in 1..=args.trials {
        let start = Instant::now();
        let cipher = public_key.encode(message)?;
        let encode_time = start.elapsed();

        let start = Instant::now();
        let decoded = private_key.decode(&cipher)?;
        let decode_time = start.elapsed();

        let start = Instant::now();
        let signature = private_key.sign(message);
        let verified = public_key.verify(&signature, &decoded);
        let sign_time = start.elapsed();

        // A signature over another message must not verify
        let forged = public_key.verify(&signature, b"Test");

        info!(
            "trial {}: encode {:?}, decode {:?}, sign+verify {:?}",
            trial, encode_time, decode_time, sign_time
        );
        println!("Encoded: {}", hex::encode(cipher.to_bytes_be()));
        println!("Decoded text: {}", String::from_utf8_lossy(&decoded));
        println!("Signature valid: {}, wrong message accepted: {}", verified, forged);

        if decoded == message && verified && !forged {
            tally.success += 1;
        } else {
            tally.failed += 1;
        }
    }

    Ok(tally)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(tally) => {
            println!();
            println!("-- Test Results --");
            println!("Tests ran: {}", args.trials);
            println!("Failed: {}", tally.failed);
            println!("Success: {}", tally.success);
            println!("Overall pass: {}", tally.failed == 0);
            if tally.failed > 0 {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
