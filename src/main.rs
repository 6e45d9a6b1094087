use num_bigint::BigUint;
use phe::{HomomorphicOperations, KeyPair, Result};
use tracing::{error, info};

fn run() -> Result<()> {
    println!("=== Paillier Homomorphic Encryption Demo ===\n");

    println!("Generating 2048-bit key pair...");
    let keypair = KeyPair::generate(2048)?;
    info!(bits = keypair.bit_size(), "key pair ready");
    println!("{}", keypair);

    println!("\n--- Round trip ---");
    let m = BigUint::from(1u32);
    let c = keypair.public_key.encrypt(&m)?;
    let decrypted = keypair.private_key.decrypt(&c)?;
    println!("c = {}", c);
    println!("m = {}", decrypted);

    println!("\n--- Homomorphic addition ---");
    let m1 = BigUint::from(3u32);
    let m2 = BigUint::from(5u32);
    let c1 = keypair.public_key.encrypt(&m1)?;
    let c2 = keypair.public_key.encrypt(&m2)?;
    let sum = keypair.public_key.add(&c1, &c2)?;
    println!("{} + {} = {}", m1, m2, keypair.private_key.decrypt(&sum)?);

    println!("\n--- Scalar multiplication ---");
    let product = keypair.public_key.scalar_mul(&c1, &m2)?;
    println!("{} * {} = {}", m1, m2, keypair.private_key.decrypt(&product)?);

    let product = keypair.public_key.scalar_mul(&c2, &m1)?;
    println!("{} * {} = {}", m2, m1, keypair.private_key.decrypt(&product)?);

    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run() {
        error!(error = %e, "demo failed");
        std::process::exit(1);
    }
}
