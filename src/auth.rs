use anyhow::{Result, bail};
use std::io::BufRead;
use zeroize::Zeroizing;

/// Prompt on the terminal without echoing input.
///
/// An empty answer is returned as is; the vault decides what it means.
pub fn prompt_secret(prompt: &str) -> Result<Zeroizing<String>> {
    Ok(into_secret(rpassword::prompt_password(prompt)?))
}

/// Read a secret as the next line of a non-interactive input.
///
/// `echo -e "retrieve alice\npw1" | datavault`
pub fn read_secret_line<R: BufRead>(input: &mut R) -> Result<Zeroizing<String>> {
    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        bail!("no secret provided");
    }
    Ok(into_secret(buf))
}

fn into_secret(raw: String) -> Zeroizing<String> {
    let mut secret = Zeroizing::new(raw);
    trim_newline(&mut secret);
    secret
}

pub fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
