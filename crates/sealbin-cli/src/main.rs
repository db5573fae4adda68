//! sealbin: zero-knowledge pastebin CLI
//!
//! Commands:
//!   post [<file>]    - encrypt stdin or a file, upload it, print the share link
//!   get <link>       - fetch a paste by share link and decrypt it locally
//!   delete <target>  - delete a paste by share link (password) or raw token
//!
//! The server only ever sees ciphertext. The password, the salt-bearing URL
//! fragment, and every derived key stay on this side of the wire.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use sealbin_core::encoding;
use sealbin_core::wire::{
    CreatePasteRequest, DeletePasteRequest, PasteMeta, PowIssueResponse, PowSolution,
};
use sealbin_crypto::{decrypt, derive_delete_auth, encrypt, EncryptedPayload, KdfParams};

mod client;
mod link;

use client::ApiClient;
use link::ShareLink;

#[derive(Parser, Debug)]
#[command(
    name = "sealbin",
    version,
    about = "Zero-knowledge pastebin client",
    long_about = "sealbin: encrypt text locally, share it by link, and let the \
                  server hold nothing it could read"
)]
struct Cli {
    /// Base URL of the sealbin server
    #[arg(
        long,
        short = 's',
        env = "SEALBIN_SERVER",
        default_value = "http://127.0.0.1:8300"
    )]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt and upload a paste, printing its share link and delete token
    Post {
        /// File to post (default: read stdin)
        file: Option<PathBuf>,

        /// MIME type recorded with the paste
        #[arg(long, default_value = "text/plain")]
        mime: String,

        /// Lifetime in seconds before the server expires the paste
        #[arg(long, default_value_t = 86_400)]
        expires_in: u64,

        /// Number of views before the paste self-destructs (default: unlimited)
        #[arg(long)]
        views: Option<u32>,

        /// Destroy the paste after a single view (same as --views 1)
        #[arg(long, conflicts_with = "views")]
        single_view: bool,

        /// Encryption password (prompted when omitted)
        #[arg(long, env = "SEALBIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Fetch a paste by share link and decrypt it
    Get {
        /// Full share link, including the #salt:iv fragment
        link: String,

        /// Write plaintext here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Decryption password (prompted when omitted)
        #[arg(long, env = "SEALBIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Delete a paste early
    Delete {
        /// Share link (delete auth is re-derived from the password) or bare id
        target: String,

        /// Raw delete token from `post`; skips the password prompt
        #[arg(long)]
        token: Option<String>,

        /// Password to derive the delete authorization from (prompted when
        /// omitted and no --token is given)
        #[arg(long, env = "SEALBIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    client::check_base_url(&cli.server)?;
    let api = ApiClient::new(&cli.server);

    match cli.command {
        Commands::Post {
            file,
            mime,
            expires_in,
            views,
            single_view,
            password,
        } => cmd_post(&api, file, mime, expires_in, views, single_view, password).await,
        Commands::Get {
            link,
            output,
            password,
        } => cmd_get(&api, &link, output.as_deref(), password).await,
        Commands::Delete {
            target,
            token,
            password,
        } => cmd_delete(&api, &target, token, password).await,
    }
}

async fn cmd_post(
    api: &ApiClient,
    file: Option<PathBuf>,
    mime: String,
    expires_in: u64,
    views: Option<u32>,
    single_view: bool,
    password: Option<String>,
) -> Result<()> {
    let plaintext = read_input(file.as_deref())?;
    let password = resolve_password(password, true)?;
    let params = KdfParams::default();

    let payload = encrypt(&plaintext, &password, &params).context("encrypting paste")?;
    let delete_auth = derive_delete_auth(&password, &payload.salt, &params)
        .context("deriving delete authorization")?;

    let pow = solve_pow_if_required(api).await?;

    let req = CreatePasteRequest {
        ct: encoding::encode(&payload.ciphertext),
        iv: encoding::encode(&payload.iv),
        meta: PasteMeta {
            expire_ts: unix_secs(SystemTime::now() + Duration::from_secs(expires_in)),
            mime,
            views_allowed: views,
            single_view,
        },
        pow,
        delete_auth: delete_auth.encode(),
    };

    let created = api.create_paste(&req).await?;
    let share = ShareLink {
        id: created.id,
        salt: payload.salt,
        iv: payload.iv,
    };

    println!("{}", share.to_url(api.base()));
    eprintln!("delete token: {}", created.delete_token);
    eprintln!("(viewers who know the password can also delete without the token)");
    Ok(())
}

async fn cmd_get(
    api: &ApiClient,
    raw_link: &str,
    output: Option<&std::path::Path>,
    password: Option<String>,
) -> Result<()> {
    let share = ShareLink::parse(raw_link).context("parsing share link")?;
    let password = resolve_password(password, false)?;

    let fetched = api.retrieve_paste(&share.id).await?;
    if let Some(left) = fetched.views_left {
        eprintln!("views left including this one: {left}");
    }

    // The link fragment, not the server, is authoritative for iv and salt
    let payload = EncryptedPayload {
        ciphertext: encoding::decode(&fetched.ct).context("server sent undecodable ciphertext")?,
        iv: share.iv,
        salt: share.salt,
    };
    let plaintext = decrypt(&payload, &password, &KdfParams::default())
        .context("decryption failed; wrong password or corrupted paste")?;

    match output {
        Some(path) => std::fs::write(path, &plaintext)
            .with_context(|| format!("writing {}", path.display()))?,
        None => std::io::stdout()
            .write_all(&plaintext)
            .context("writing plaintext to stdout")?,
    }
    Ok(())
}

async fn cmd_delete(
    api: &ApiClient,
    target: &str,
    token: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let (id, delete_auth) = match token {
        Some(token) => (target_id(target)?, token),
        None => {
            let share = ShareLink::parse(target).context(
                "deleting by password needs a full share link; pass --token for a bare id",
            )?;
            let password = resolve_password(password, false)?;
            let auth = derive_delete_auth(&password, &share.salt, &KdfParams::default())
                .context("deriving delete authorization")?;
            (share.id, auth.encode())
        }
    };

    api.delete_paste(&id, &DeletePasteRequest { delete_auth })
        .await?;
    eprintln!("deleted {id}");
    Ok(())
}

/// Fetch a challenge and grind it when the server demands proof of work.
async fn solve_pow_if_required(api: &ApiClient) -> Result<Option<PowSolution>> {
    match api.fetch_pow().await? {
        PowIssueResponse::Disabled { .. } => Ok(None),
        PowIssueResponse::Challenge {
            challenge,
            difficulty,
            ..
        } => {
            eprintln!("solving proof-of-work (difficulty {difficulty})...");
            let cancel = CancellationToken::new();
            let nonce = sealbin_pow::solve(&challenge, difficulty, &cancel)
                .await
                .context("proof-of-work search failed")?;
            Ok(Some(PowSolution { challenge, nonce }))
        }
    }
}

fn read_input(file: Option<&std::path::Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

/// Use the supplied password or prompt on the tty. Posting confirms the
/// password to catch typos that would lock the paste forever.
fn resolve_password(provided: Option<String>, confirm: bool) -> Result<SecretString> {
    if let Some(p) = provided {
        return Ok(SecretString::from(p));
    }
    let first = rpassword::prompt_password("Password: ").context("reading password")?;
    if first.is_empty() {
        bail!("password must not be empty");
    }
    if confirm {
        let second = rpassword::prompt_password("Confirm password: ").context("reading password")?;
        if first != second {
            bail!("passwords do not match");
        }
    }
    Ok(SecretString::from(first))
}

/// Accept either a bare id or a share link when a raw token is supplied.
fn target_id(target: &str) -> Result<String> {
    if let Ok(share) = ShareLink::parse(target) {
        return Ok(share.id);
    }
    if target.contains('/') || target.contains('?') {
        bail!("could not extract a paste id from {target:?}");
    }
    Ok(target.to_string())
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
