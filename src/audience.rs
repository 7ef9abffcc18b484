//! Audience comparison.
//!
//! The assertion's `aud` claim is a full origin (we issued it). Relying
//! parties should send a full origin too, but several deployed forms are
//! accepted: `http://rp.tld`, `http://rp.tld:8080`, `rp.tld:8080`, or a
//! bare `rp.tld`. Every component the relying party does provide must
//! match exactly.

use crate::error::{Result, VerifyError};

struct Origin {
    scheme: String,
    host: String,
    port: u16,
}

fn default_port(scheme: &str) -> u16 {
    if scheme == "https" {
        443
    } else {
        80
    }
}

fn parse_origin(origin: &str) -> Option<Origin> {
    let (scheme, rest) = origin.split_once("://")?;
    if scheme != "http" && scheme != "https" {
        return None;
    }
    // Tolerate a trailing path component; only the authority matters.
    let authority = rest.split('/').next()?;
    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host, port.parse().ok()?),
        None => (authority, default_port(scheme)),
    };
    if host.is_empty() {
        return None;
    }
    Some(Origin {
        scheme: scheme.to_owned(),
        host: host.to_owned(),
        port,
    })
}

/// Compares the trusted assertion audience (`want`, a full origin) against
/// whatever the relying party supplied (`got`).
pub fn compare(want: &str, got: &str) -> Result<()> {
    let mismatch = || VerifyError::AudienceMismatch {
        expected: want.to_owned(),
        got: got.to_owned(),
    };

    let want = parse_origin(want).ok_or_else(mismatch)?;

    let (got_host, got_port): (&str, Option<u16>) =
        if got.starts_with("http://") || got.starts_with("https://") {
            let parsed = parse_origin(got).ok_or_else(mismatch)?;
            return if parsed.scheme == want.scheme
                && parsed.host == want.host
                && parsed.port == want.port
            {
                Ok(())
            } else {
                Err(mismatch())
            };
        } else if let Some((host, port)) = got.split_once(':') {
            let port = port.parse().map_err(|_| mismatch())?;
            (host, Some(port))
        } else {
            (got, None)
        };

    if let Some(port) = got_port {
        if port != want.port {
            return Err(mismatch());
        }
    }
    if got_host.is_empty() || got_host != want.host {
        return Err(mismatch());
    }
    Ok(())
}
