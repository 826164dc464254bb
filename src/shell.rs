//! Line-oriented front end driving a [`DataVault`] session.

use anyhow::Result;
use datavault::{DataVault, LockoutState, VaultError};
use serde::{Serialize, Serializer};
use std::fmt;
use std::io::{BufRead, Write};
use zeroize::{Zeroize, Zeroizing};

use crate::auth;

const HELP: &str = "\
commands:
  store <label> <text...>   encrypt text under a passkey (asked next)
  retrieve <label>          decrypt stored text (passkey asked next)
  reauth [label]            lift a lockout (admin secret asked next)
  remove <label>            delete stored text
  list                      show stored labels
  locked                    show locked labels
  status <label>            show record and lockout state
  help                      show this message
  quit                      leave; all data is discarded";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Store { label: &'a str, text: &'a str },
    Retrieve { label: &'a str },
    Reauth { label: Option<&'a str> },
    Remove { label: &'a str },
    List,
    Locked,
    Status { label: &'a str },
    Help,
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Result<Self, String> {
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim_start()),
            None => (line, ""),
        };
        let one_label = move |usage: &str| -> Result<&'a str, String> {
            match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
                [label] => Ok(*label),
                _ => Err(format!("usage: {usage}")),
            }
        };

        match name {
            "store" => match rest.split_once(char::is_whitespace) {
                Some((label, text)) if !text.trim().is_empty() => Ok(Command::Store {
                    label,
                    text: text.trim_start(),
                }),
                _ => Err("usage: store <label> <text...>".into()),
            },
            "retrieve" => Ok(Command::Retrieve {
                label: one_label("retrieve <label>")?,
            }),
            "reauth" => match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
                [] => Ok(Command::Reauth { label: None }),
                [label] => Ok(Command::Reauth {
                    label: Some(*label),
                }),
                _ => Err("usage: reauth [label]".into()),
            },
            "remove" => Ok(Command::Remove {
                label: one_label("remove <label>")?,
            }),
            "list" => Ok(Command::List),
            "locked" => Ok(Command::Locked),
            "status" => Ok(Command::Status {
                label: one_label("status <label>")?,
            }),
            "help" => Ok(Command::Help),
            // never echo the line, it may be a mistyped secret
            _ => Err("unknown command, try 'help'".into()),
        }
    }

    /// Whether the named command is followed by a secret line.
    fn takes_secret(line: &str) -> bool {
        let name = line.split_whitespace().next().unwrap_or_default();
        matches!(name, "store" | "retrieve" | "reauth")
    }
}

fn expose<S: Serializer>(secret: &Zeroizing<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(secret)
}

#[derive(Debug, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
enum Reply {
    Stored {
        label: String,
        ciphertext: String,
    },
    Retrieved {
        label: String,
        #[serde(serialize_with = "expose")]
        plaintext: Zeroizing<String>,
    },
    Reauthorized {
        label: Option<String>,
    },
    Removed {
        label: String,
    },
    Labels {
        labels: Vec<String>,
    },
    Locked {
        labels: Vec<String>,
    },
    Status {
        label: String,
        stored: bool,
        updated: Option<String>,
        lockout: LockoutState,
    },
    Help,
    Error {
        kind: &'static str,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        attempts_remaining: Option<u32>,
    },
}

impl Reply {
    fn usage(message: String) -> Self {
        Reply::Error {
            kind: "usage",
            message,
            attempts_remaining: None,
        }
    }
}

impl From<VaultError> for Reply {
    fn from(err: VaultError) -> Self {
        let (kind, attempts_remaining) = match &err {
            VaultError::Validation(_) => ("validation", None),
            VaultError::NotFound(_) => ("not_found", None),
            VaultError::LockedOut(_) => ("locked_out", None),
            VaultError::WrongPasskey { attempts_remaining } => {
                ("wrong_passkey", Some(*attempts_remaining))
            }
            VaultError::DecryptionFailure(_) => ("decryption_failure", None),
            VaultError::WrongAdminSecret => ("wrong_admin_secret", None),
            VaultError::Encryption(_) => ("encryption", None),
            VaultError::Config(_) => ("config", None),
        };
        Reply::Error {
            kind,
            message: err.to_string(),
            attempts_remaining,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Stored { label, ciphertext } => {
                writeln!(f, "stored data for '{label}'; keep this ciphertext:")?;
                write!(f, "{ciphertext}")
            }
            Reply::Retrieved { plaintext, .. } => write!(f, "{}", plaintext.as_str()),
            Reply::Reauthorized { label: Some(label) } => {
                write!(f, "reauthorized '{label}'; retrieval may be retried")
            }
            Reply::Reauthorized { label: None } => write!(f, "reauthorized; no label was locked"),
            Reply::Removed { label } => write!(f, "removed '{label}'"),
            Reply::Labels { labels } if labels.is_empty() => write!(f, "no data stored"),
            Reply::Labels { labels } => write!(f, "{}", labels.join("\n")),
            Reply::Locked { labels } if labels.is_empty() => write!(f, "no locked labels"),
            Reply::Locked { labels } => write!(f, "{}", labels.join("\n")),
            Reply::Status {
                label,
                stored,
                updated,
                lockout,
            } => {
                let record = match (stored, updated) {
                    (true, Some(updated)) => format!("stored (updated {updated})"),
                    _ => "not stored".to_string(),
                };
                let lockout = match lockout {
                    LockoutState::Locked { .. } => "locked".to_string(),
                    LockoutState::Open { failed_attempts } => {
                        format!("open, {failed_attempts} failed attempt(s)")
                    }
                };
                write!(f, "{label}: {record}; {lockout}")
            }
            Reply::Help => write!(f, "{HELP}"),
            Reply::Error { message, .. } => write!(f, "error: {message}"),
        }
    }
}

pub struct Shell<R, W> {
    vault: DataVault,
    input: R,
    out: W,
    interactive: bool,
    json: bool,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(vault: DataVault, input: R, out: W, interactive: bool, json: bool) -> Self {
        Self {
            vault,
            input,
            out,
            interactive,
            json,
        }
    }

    /// Process commands until `quit` or end of input.
    pub fn run(&mut self) -> Result<()> {
        if self.interactive && !self.json {
            writeln!(self.out, "datavault: type 'help' for commands")?;
        }

        loop {
            if self.interactive {
                write!(self.out, "datavault> ")?;
                self.out.flush()?;
            }

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "quit" || line == "exit" {
                break;
            }

            let reply = match Command::parse(line) {
                Ok(command) => self.execute(command),
                Err(usage) => {
                    if !self.interactive && Command::takes_secret(line) {
                        // keep the secret line from being read as a command
                        let _ = self.read_secret("");
                    }
                    Reply::usage(usage)
                }
            };
            self.emit(&reply)?;
        }

        self.out.flush()?;
        Ok(())
    }

    fn read_secret(&mut self, prompt: &str) -> Result<Zeroizing<String>> {
        if self.interactive {
            auth::prompt_secret(prompt)
        } else {
            auth::read_secret_line(&mut self.input)
        }
    }

    fn execute(&mut self, command: Command<'_>) -> Reply {
        match command {
            Command::Store { label, text } => {
                let passkey = match self.read_secret("Passkey: ") {
                    Ok(passkey) => passkey,
                    Err(err) => return Reply::usage(err.to_string()),
                };
                match self.vault.store(label, text, &passkey) {
                    Ok(ciphertext) => Reply::Stored {
                        label: label.to_string(),
                        ciphertext,
                    },
                    Err(err) => err.into(),
                }
            }
            Command::Retrieve { label } => {
                let mut passkey = match self.read_secret("Passkey: ") {
                    Ok(passkey) => passkey,
                    Err(err) => return Reply::usage(err.to_string()),
                };
                if self.vault.lockout_state(label).is_locked() {
                    // refused at the gate, the passkey is never compared
                    passkey.zeroize();
                }
                match self.vault.retrieve(label, &passkey) {
                    Ok(plaintext) => Reply::Retrieved {
                        label: label.to_string(),
                        plaintext,
                    },
                    Err(err) => err.into(),
                }
            }
            Command::Reauth { label } => {
                let secret = match self.read_secret("Admin secret: ") {
                    Ok(secret) => secret,
                    Err(err) => return Reply::usage(err.to_string()),
                };
                let result = match label {
                    Some(label) => self
                        .vault
                        .reauthorize_label(label, &secret)
                        .map(|()| Some(label.to_string())),
                    None => self.vault.reauthorize(&secret),
                };
                match result {
                    Ok(label) => Reply::Reauthorized { label },
                    Err(err) => err.into(),
                }
            }
            Command::Remove { label } => match self.vault.remove(label) {
                Ok(()) => Reply::Removed {
                    label: label.to_string(),
                },
                Err(err) => err.into(),
            },
            Command::List => Reply::Labels {
                labels: self.vault.labels().into_iter().map(String::from).collect(),
            },
            Command::Locked => Reply::Locked {
                labels: self
                    .vault
                    .locked_labels()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            },
            Command::Status { label } => {
                let record = self.vault.record(label);
                Reply::Status {
                    label: label.to_string(),
                    stored: record.is_some(),
                    updated: record.map(|r| r.updated().to_rfc3339()),
                    lockout: self.vault.lockout_state(label),
                }
            }
            Command::Help => Reply::Help,
        }
    }

    fn emit(&mut self, reply: &Reply) -> Result<()> {
        if self.json {
            serde_json::to_writer(&mut self.out, reply)?;
            writeln!(self.out)?;
        } else {
            writeln!(self.out, "{reply}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(script: &str, json: bool) -> String {
        let mut out = Vec::new();
        {
            let mut shell =
                Shell::new(DataVault::new(), Cursor::new(script), &mut out, false, json);
            shell.run().unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parse_commands() {
        assert_eq!(
            Command::parse("store alice  hello   world"),
            Ok(Command::Store {
                label: "alice",
                text: "hello   world"
            })
        );
        assert_eq!(
            Command::parse("retrieve alice"),
            Ok(Command::Retrieve { label: "alice" })
        );
        assert_eq!(
            Command::parse("reauth"),
            Ok(Command::Reauth { label: None })
        );
        assert_eq!(
            Command::parse("reauth bob"),
            Ok(Command::Reauth { label: Some("bob") })
        );
        assert_eq!(Command::parse("list"), Ok(Command::List));
        assert!(Command::parse("store alice").is_err());
        assert!(Command::parse("retrieve").is_err());
        assert!(Command::parse("retrieve a b").is_err());
        assert!(Command::parse("frobnicate").is_err());
    }

    #[test]
    fn store_then_retrieve() {
        let out = run("store alice secret message\npw1\nretrieve alice\npw1\n", false);

        assert!(out.contains("stored data for 'alice'"));
        assert!(out.lines().any(|l| l == "secret message"));
    }

    #[test]
    fn lockout_and_reauth_flow() {
        let script = "store alice secret message\npw1\n\
                      retrieve alice\nwrong\n\
                      retrieve alice\nwrong\n\
                      retrieve alice\nwrong\n\
                      retrieve alice\npw1\n\
                      locked\n\
                      reauth\nnope\n\
                      reauth\nadmin123\n\
                      retrieve alice\npw1\n";
        let out = run(script, false);

        assert!(out.contains("2 attempt(s) left"));
        assert!(out.contains("1 attempt(s) left"));
        assert!(out.contains("0 attempt(s) left"));
        assert!(out.contains("too many failed attempts for 'alice'"));
        assert!(out.lines().any(|l| l == "alice"));
        assert!(out.contains("incorrect admin secret"));
        assert!(out.contains("reauthorized 'alice'"));
        assert!(out.lines().any(|l| l == "secret message"));
    }

    #[test]
    fn locked_retrieve_still_consumes_passkey_line() {
        let script = "store alice a\npw1\n\
                      store bob b\npw2\n\
                      retrieve alice\nwrong\n\
                      retrieve alice\nwrong\n\
                      retrieve alice\nwrong\n\
                      retrieve alice\nremove bob\n\
                      retrieve alice\nhunter2\n\
                      list\n";
        let out = run(script, false);

        assert!(!out.contains("removed 'bob'"));
        assert!(!out.contains("hunter2"));
        assert!(!out.contains("unknown command"));
        assert_eq!(out.matches("too many failed attempts").count(), 2);
        assert!(out.lines().any(|l| l == "bob"));
    }

    #[test]
    fn usage_error_consumes_secret_line() {
        let out = run("store alice\nremove bob\nretrieve\nhunter2\nlist\n", false);

        assert_eq!(out.matches("error: usage:").count(), 2);
        assert!(!out.contains("hunter2"));
        assert!(!out.contains("unknown command"));
        assert!(out.contains("no data stored"));
    }

    #[test]
    fn unknown_command_is_not_echoed() {
        let out = run("hunter2\n", false);

        assert!(out.contains("error: unknown command"));
        assert!(!out.contains("hunter2"));
    }

    #[test]
    fn empty_passkey_counts_as_wrong_attempt() {
        let out = run("store alice hi\npw1\nretrieve alice\n\n", false);
        assert!(out.contains("incorrect passkey, 2 attempt(s) left"));
    }

    #[test]
    fn json_status_carries_lockout_state() {
        let out = run(
            "store alice hi\npw1\nretrieve alice\nwrong\nstatus alice\nlocked\n",
            true,
        );
        let replies: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(replies[2]["reply"], "status");
        assert_eq!(replies[2]["lockout"]["state"], "open");
        assert_eq!(replies[2]["lockout"]["failed_attempts"], 1);
        assert_eq!(replies[3]["reply"], "locked");
        assert_eq!(replies[3]["labels"], serde_json::json!([]));
    }

    #[test]
    fn json_replies() {
        let out = run("retrieve bob\nanything\nlist\nbogus\n", true);
        let replies: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(replies[0]["reply"], "error");
        assert_eq!(replies[0]["kind"], "not_found");
        assert_eq!(replies[1]["reply"], "labels");
        assert_eq!(replies[1]["labels"], serde_json::json!([]));
        assert_eq!(replies[2]["kind"], "usage");
    }

    #[test]
    fn json_wrong_passkey_reports_attempts() {
        let out = run("store alice hi\npw1\nretrieve alice\nwrong\n", true);
        let last: serde_json::Value = serde_json::from_str(out.lines().last().unwrap()).unwrap();

        assert_eq!(last["kind"], "wrong_passkey");
        assert_eq!(last["attempts_remaining"], 2);
    }

    #[test]
    fn status_and_remove() {
        let out = run(
            "store alice hi\npw1\nstatus alice\nremove alice\nstatus alice\nlist\n",
            false,
        );

        assert!(out.contains("alice: stored (updated"));
        assert!(out.contains("removed 'alice'"));
        assert!(out.contains("alice: not stored; open, 0 failed attempt(s)"));
        assert!(out.contains("no data stored"));
    }

    #[test]
    fn quit_stops_processing() {
        let out = run("quit\nlist\n", false);
        assert!(out.is_empty());
    }

    #[test]
    fn missing_secret_at_end_of_input() {
        let out = run("store alice hi\n", false);
        assert!(out.contains("error: no secret provided"));
    }
}
