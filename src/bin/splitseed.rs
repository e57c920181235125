//! `splitseed` CLI: a thin consumer of the `splitseed` library. It never
//! implements cryptography itself, only argument parsing, hidden-input
//! prompting, and calling into the library's generation/recovery
//! pipelines.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rpassword::prompt_password;

use splitseed::cancel::CancelToken;
use splitseed::entropy::EntropySource;
use splitseed::generate::{self, GenerationRequest, PipelineConfig};
use splitseed::kdf;
use splitseed::params;
use splitseed::recover::{self, ShareEntry};
use splitseed::display;

#[derive(Parser, Debug)]
#[command(name = "splitseed", version, author, about = "Brainkey/salt wallet-seed toolkit")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Generate a new salt, brainkey, and share set for a wallet.
    Generate {
        #[arg(long)]
        wallet_name: String,
        #[arg(long, value_parser = parse_scheme)]
        scheme: (u8, u8),
        #[arg(long, default_value_t = 1)]
        shareset_id: u32,
        #[arg(long, default_value_t = 100)]
        kdf_m: u32,
        #[arg(long, default_value_t = 1)]
        kdf_t: u32,
    },
    /// Recover a wallet seed from `threshold` shares, entered as intcodes.
    RecoverShares {
        #[arg(long)]
        wallet_name: String,
        #[arg(long, value_delimiter = ',')]
        share_header: Vec<String>,
        #[arg(long, value_delimiter = ';')]
        share_body: Vec<String>,
    },
    /// Recover a wallet seed from a salt and brainkey, entered as intcodes.
    RecoverSalt {
        #[arg(long)]
        wallet_name: String,
        #[arg(long)]
        salt_header: String,
        #[arg(long)]
        salt_body: String,
        #[arg(long)]
        brainkey_body: String,
    },
    /// Measure how many KDF iterations fit a target duration on this
    /// machine, at a fixed memory cost.
    Calibrate {
        #[arg(long, default_value_t = 100)]
        kdf_m: u32,
        #[arg(long, default_value_t = 2)]
        target_secs: u64,
    },
}

/// Parse a `--scheme 3of5`-style flag into `(threshold, num_shares)`,
/// mirroring the original's `click`-based scheme parsing.
fn parse_scheme(s: &str) -> std::result::Result<(u8, u8), String> {
    let (t, n) = s
        .split_once("of")
        .ok_or_else(|| format!("expected TofN, got {s:?}"))?;
    let t: u8 = t.parse().map_err(|_| format!("bad threshold in {s:?}"))?;
    let n: u8 = n.parse().map_err(|_| format!("bad share count in {s:?}"))?;
    if t > n {
        return Err(format!("threshold {t} exceeds share count {n}"));
    }
    Ok((t, n))
}

/// Reads `/proc/sys/kernel/random/entropy_avail` on Linux; reports a
/// generous fixed value everywhere else. This introspection lives outside
/// the library's boundary by design.
struct OsEntropySource;

impl EntropySource for OsEntropySource {
    fn available_bytes(&self) -> usize {
        #[cfg(target_os = "linux")]
        {
            if let Ok(contents) = std::fs::read_to_string("/proc/sys/kernel/random/entropy_avail") {
                if let Ok(bits) = contents.trim().parse::<usize>() {
                    return bits / 8;
                }
            }
        }
        256
    }
}

fn hex_to_bytes(label: &str, s: &str) -> Result<Vec<u8>> {
    hex::decode(s.trim()).with_context(|| format!("{label}: not valid hex"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Generate {
            wallet_name,
            scheme,
            shareset_id,
            kdf_m,
            kdf_t,
        } => cmd_generate(&wallet_name, scheme, shareset_id, kdf_m, kdf_t),
        Cmd::RecoverShares {
            wallet_name,
            share_header,
            share_body,
        } => cmd_recover_shares(&wallet_name, &share_header, &share_body),
        Cmd::RecoverSalt {
            wallet_name,
            salt_header,
            salt_body,
            brainkey_body,
        } => cmd_recover_salt(&wallet_name, &salt_header, &salt_body, &brainkey_body),
        Cmd::Calibrate { kdf_m, target_secs } => cmd_calibrate(kdf_m, target_secs),
    }
}

fn cmd_generate(
    wallet_name: &str,
    (sss_t, sss_n): (u8, u8),
    shareset_id: u32,
    kdf_m: u32,
    kdf_t: u32,
) -> Result<()> {
    let salt_phrase = prompt_password("Salt phrase: ").context("reading salt phrase")?;
    let confirm = prompt_password("Confirm salt phrase: ").context("reading salt phrase")?;
    if salt_phrase != confirm {
        bail!("salt phrases did not match");
    }

    let req = GenerationRequest {
        salt_phrase: &salt_phrase,
        wallet_name,
        shareset_id,
        sss_t,
        sss_n,
        kdf_m,
        kdf_t,
    };
    let config = PipelineConfig::new();
    let artifacts = generate::run(&req, &config, &OsEntropySource, &CancelToken::new())
        .context("generation pipeline failed")?;

    println!("Salt:");
    println!("{}", display::format_artifact(&artifacts.raw_salt));
    println!("  header: {}", hex::encode(artifacts.salt_header));
    println!();
    println!("Brainkey:");
    println!("{}", display::format_artifact(&artifacts.raw_brainkey));
    println!("  header: {}", hex::encode(artifacts.brainkey_header));
    println!();
    for (i, share) in artifacts.shares.iter().enumerate() {
        println!("Share {}:", i + 1);
        println!("{}", display::format_artifact(&share.body));
        println!("  header: {}", hex::encode(share.header));
        println!();
    }
    println!("Wallet seed: {}", hex::encode(&artifacts.wallet_seed));
    Ok(())
}

fn cmd_recover_shares(wallet_name: &str, headers: &[String], bodies: &[String]) -> Result<()> {
    if headers.len() != bodies.len() {
        bail!(
            "got {} share headers but {} share bodies",
            headers.len(),
            bodies.len()
        );
    }
    if headers.is_empty() {
        bail!("at least one share is required");
    }

    let mut shares = Vec::with_capacity(headers.len());
    for (header_hex, body_hex) in headers.iter().zip(bodies) {
        let header_bytes = hex_to_bytes("share header", header_hex)?;
        let header: [u8; params::SHARE_HEADER_LEN] = header_bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("share header must be {} bytes", params::SHARE_HEADER_LEN))?;
        let body = hex_to_bytes("share body", body_hex)?;
        shares.push(ShareEntry { header, body });
    }

    let seed = recover::from_shares(&shares, wallet_name).context("recovery from shares failed")?;
    println!("Wallet seed: {}", hex::encode(seed));
    Ok(())
}

fn cmd_recover_salt(
    wallet_name: &str,
    salt_header_hex: &str,
    salt_body_hex: &str,
    brainkey_body_hex: &str,
) -> Result<()> {
    let salt_header_bytes = hex_to_bytes("salt header", salt_header_hex)?;
    let salt_header: [u8; params::SALT_HEADER_LEN] = salt_header_bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("salt header must be {} bytes", params::SALT_HEADER_LEN))?;
    let raw_salt = hex_to_bytes("salt body", salt_body_hex)?;
    let raw_brainkey = hex_to_bytes("brainkey body", brainkey_body_hex)?;

    let seed = recover::from_salt_and_brainkey(&raw_salt, &raw_brainkey, &salt_header, wallet_name)
        .context("recovery from salt and brainkey failed")?;
    println!("Wallet seed: {}", hex::encode(seed));
    Ok(())
}

fn cmd_calibrate(kdf_m: u32, target_secs: u64) -> Result<()> {
    let cancel = CancelToken::new();
    let trace = kdf::kdf_params_for_duration_with_trace(
        kdf_m,
        Duration::from_secs(target_secs),
        Duration::from_secs(target_secs.saturating_mul(4).max(10)),
        &cancel,
    )
    .context("calibration failed")?;
    for trial in &trace.trials {
        eprintln!(
            "trial: {}",
            serde_json::to_string(trial).expect("CalibrationTrial always serializes")
        );
    }
    let calibrated = trace.chosen;
    println!(
        "kdf_p={} kdf_m={} kdf_t={}",
        calibrated.kdf_p, calibrated.kdf_m, calibrated.kdf_t
    );
    Ok(())
}
