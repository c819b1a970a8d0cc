use native_tls::TlsConnector;
use trust_dns_resolver::Resolver;

use crate::smtp_verify::dns::{HostCandidate, build_resolver, resolve_hosts};
use crate::smtp_verify::error::SmtpVerifyError;
use crate::smtp_verify::options::SmtpProbeOptions;
use crate::smtp_verify::session::{SmtpReply, SmtpSession};
use crate::smtp_verify::types::{Existence, SmtpProbeReport};
use crate::smtp_verify::util::random_local_part;

/// Reusable SMTP prober: resolver and TLS connector are built once.
pub struct SmtpProber {
    resolver: Resolver,
    connector: TlsConnector,
    options: SmtpProbeOptions,
}

impl SmtpProber {
    pub fn new(options: SmtpProbeOptions) -> Result<Self, SmtpVerifyError> {
        let resolver = build_resolver()?;
        let connector = TlsConnector::new().map_err(|err| SmtpVerifyError::Tls { source: err })?;
        Ok(Self {
            resolver,
            connector,
            options,
        })
    }

    /// Probe `local@domain` against the domain's mail servers.
    ///
    /// Errors cover the cases where no server could be asked at all
    /// (DNS failure, no host). Once a host answered, inconclusive dialogues
    /// come back as [`Existence::Indeterminate`].
    pub fn probe(&self, local: &str, domain: &str) -> Result<SmtpProbeReport, SmtpVerifyError> {
        let domain = idna::domain_to_ascii(domain.trim()).map_err(SmtpVerifyError::idna)?;
        if domain.is_empty() {
            return Err(SmtpVerifyError::Idna("domain missing".to_string()));
        }

        let options = &self.options;
        let hosts = resolve_hosts(&self.resolver, &domain, options.max_mx, options.ipv6)?;

        let mail_from = options.envelope_sender(&domain);
        let helo = options.helo_name(&domain);

        let catchall_count = options.catchall_probes.min(5);
        let catchall_locals: Vec<String> = (0..catchall_count)
            .map(|_| random_local_part(local.len()))
            .collect();

        let target = TargetAddress {
            local,
            domain: &domain,
        };

        let mut mx_tried = Vec::new();
        let mut transcripts = Vec::new();
        let mut last_result = Existence::Indeterminate("no server responded".to_string());

        for candidate in hosts {
            mx_tried.push(candidate.host.clone());
            match probe_host(
                &candidate,
                &target,
                options,
                &self.connector,
                &mail_from,
                helo,
                &catchall_locals,
            ) {
                Ok(host_report) => {
                    transcripts.extend(host_report.transcript);
                    if !matches!(host_report.existence, Existence::Indeterminate(_)) {
                        return Ok(SmtpProbeReport::new(
                            host_report.existence,
                            mx_tried,
                            transcripts,
                            host_report.catch_all_note,
                        ));
                    }
                    last_result = host_report.existence;
                }
                Err(err) => {
                    transcripts.push(format!("[{}] ! error: {err}", candidate.host));
                    last_result = Existence::Indeterminate(err.to_string());
                }
            }
        }

        Ok(SmtpProbeReport::new(last_result, mx_tried, transcripts, None))
    }
}

pub(crate) struct TargetAddress<'a> {
    pub local: &'a str,
    pub domain: &'a str,
}

pub(crate) struct HostReport {
    pub existence: Existence,
    /// Why catch-all detection was inconclusive for an accepted target.
    pub catch_all_note: Option<String>,
    pub transcript: Vec<String>,
}

fn finish(session: &mut SmtpSession, existence: Existence) -> HostReport {
    session.quit();
    HostReport {
        existence,
        catch_all_note: None,
        transcript: session.take_transcript(),
    }
}

pub(crate) fn probe_host(
    candidate: &HostCandidate,
    target: &TargetAddress<'_>,
    options: &SmtpProbeOptions,
    connector: &TlsConnector,
    mail_from: &str,
    helo: &str,
    catchall_locals: &[String],
) -> Result<HostReport, SmtpVerifyError> {
    let mut session = SmtpSession::connect(
        &candidate.host,
        &candidate.addresses,
        &options.route,
        options.timeout(),
    )?;
    let banner = session.read_banner()?;
    if !banner.is_positive_completion() {
        let reason = if banner.code == 521 {
            "server does not receive mail".to_string()
        } else {
            format!("banner rejected with {}", banner.code)
        };
        return Ok(finish(&mut session, Existence::Indeterminate(reason)));
    }

    let helo_cmd = format!("EHLO {helo}");
    let ehlo = session.send_command(&helo_cmd)?;

    if ehlo.has_capability("STARTTLS") {
        let tls_reply = session.starttls(&candidate.host, connector, options.timeout())?;
        if !tls_reply.is_positive_completion() {
            let reason = format!(
                "STARTTLS rejected by {} (code {})",
                candidate.host, tls_reply.code
            );
            return Ok(finish(&mut session, Existence::Indeterminate(reason)));
        }
        // EHLO again over TLS
        session.send_command(&helo_cmd)?;
    }

    let envelope = format!("MAIL FROM:<{mail_from}>");
    let mail_reply = session.send_command(&envelope)?;
    if !mail_reply.is_positive_completion() {
        let reason = format!("MAIL FROM rejected with {}", mail_reply.code);
        return Ok(finish(&mut session, Existence::Indeterminate(reason)));
    }

    let target_cmd = format!("RCPT TO:<{}@{}>", target.local, target.domain);
    let target_reply = session.send_command(&target_cmd)?;

    match classify_target(&target_reply) {
        TargetExistence::DoesNotExist => {
            return Ok(finish(&mut session, Existence::DoesNotExist));
        }
        TargetExistence::Indeterminate(reason) => {
            return Ok(finish(&mut session, Existence::Indeterminate(reason)));
        }
        TargetExistence::Accepted => {}
    }

    if catchall_locals.is_empty() {
        return Ok(finish(&mut session, Existence::Exists));
    }

    let mut accepted_random = 0usize;
    let mut rejected_random = 0usize;
    let mut tempfail_random = 0usize;

    for alias in catchall_locals {
        if alias.eq_ignore_ascii_case(target.local) {
            continue;
        }
        let cmd = format!("RCPT TO:<{}@{}>", alias, target.domain);
        let reply = session.send_command(&cmd)?;
        if reply.is_positive_completion() {
            accepted_random += 1;
        } else if is_permanent_no_mailbox(&reply) {
            rejected_random += 1;
        } else if reply.is_transient_failure() {
            tempfail_random += 1;
        }
    }

    session.send_command("RSET").ok();

    // the target was accepted: whatever the aliases got, the mailbox exists
    if accepted_random > 0 {
        return Ok(finish(&mut session, Existence::CatchAll));
    }
    let note = if tempfail_random > 0 {
        Some("temporary failure on catch-all probes".to_string())
    } else if rejected_random == 0 {
        Some("ambiguous catch-all probes".to_string())
    } else {
        None
    };
    let mut report = finish(&mut session, Existence::Exists);
    report.catch_all_note = note;
    Ok(report)
}

enum TargetExistence {
    Accepted,
    DoesNotExist,
    Indeterminate(String),
}

fn classify_target(reply: &SmtpReply) -> TargetExistence {
    if reply.is_positive_completion() {
        return TargetExistence::Accepted;
    }
    if is_permanent_no_mailbox(reply) {
        return TargetExistence::DoesNotExist;
    }
    if reply.code == 521 {
        return TargetExistence::Indeterminate("521 host does not accept mail".to_string());
    }
    if reply.is_transient_failure() {
        return TargetExistence::Indeterminate(format!("temporary failure {}", reply.code));
    }
    TargetExistence::Indeterminate(format!("unexpected response {}", reply.code))
}

fn is_permanent_no_mailbox(reply: &SmtpReply) -> bool {
    matches!(reply.code, 550 | 551 | 553)
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::{SocketAddr, TcpListener};
    use std::thread;

    use super::*;

    /// Scripted SMTP server on loopback; `respond` maps a client command to
    /// the reply line(s) sent back.
    fn spawn_server(respond: fn(&str) -> String) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut writer = stream.try_clone().expect("clone stream");
            let reader = BufReader::new(stream);
            writer.write_all(b"220 mx.test ESMTP\r\n").unwrap();
            for line in reader.lines() {
                let Ok(line) = line else { break };
                let reply = if line == "QUIT" {
                    "221 bye".to_string()
                } else {
                    respond(&line)
                };
                if writer.write_all(format!("{reply}\r\n").as_bytes()).is_err() {
                    break;
                }
                if line == "QUIT" {
                    break;
                }
            }
        });
        addr
    }

    fn run(respond: fn(&str) -> String, catchall: &[&str]) -> HostReport {
        let addr = spawn_server(respond);
        let candidate = HostCandidate {
            host: "mx.test".to_string(),
            preference: 10,
            addresses: vec![addr],
        };
        let options = SmtpProbeOptions::default();
        let connector = TlsConnector::new().expect("tls connector");
        let aliases: Vec<String> = catchall.iter().map(|s| s.to_string()).collect();
        probe_host(
            &candidate,
            &TargetAddress {
                local: "alice",
                domain: "example.com",
            },
            &options,
            &connector,
            "postmaster@example.com",
            "localhost",
            &aliases,
        )
        .expect("dialogue completes")
    }

    fn strict_server(cmd: &str) -> String {
        if cmd.starts_with("EHLO") {
            "250-mx.test\r\n250 SIZE 1000".to_string()
        } else if cmd.starts_with("RCPT TO:<alice@") {
            "250 ok".to_string()
        } else if cmd.starts_with("RCPT") {
            "550 no such user".to_string()
        } else {
            "250 ok".to_string()
        }
    }

    fn open_server(cmd: &str) -> String {
        if cmd.starts_with("EHLO") {
            "250 mx.test".to_string()
        } else {
            "250 ok".to_string()
        }
    }

    fn rejecting_server(cmd: &str) -> String {
        if cmd.starts_with("RCPT") {
            "550 5.1.1 unknown".to_string()
        } else {
            "250 ok".to_string()
        }
    }

    fn greylisting_aliases_server(cmd: &str) -> String {
        if cmd.starts_with("RCPT TO:<alice@") {
            "250 ok".to_string()
        } else if cmd.starts_with("RCPT") {
            "451 4.7.1 greylisted".to_string()
        } else {
            "250 ok".to_string()
        }
    }

    fn greylisting_server(cmd: &str) -> String {
        if cmd.starts_with("RCPT") {
            "451 try later".to_string()
        } else {
            "250 ok".to_string()
        }
    }

    #[test]
    fn accepted_target_with_rejected_alias_exists() {
        let report = run(strict_server, &["zq8w3kx1"]);
        assert_eq!(report.existence, Existence::Exists);
        assert!(report.catch_all_note.is_none());
        assert!(report.transcript.iter().any(|l| l.contains("RCPT TO:<alice@")));
    }

    #[test]
    fn accepted_alias_means_catch_all() {
        let report = run(open_server, &["zq8w3kx1"]);
        assert_eq!(report.existence, Existence::CatchAll);
    }

    #[test]
    fn no_aliases_skips_catch_all_detection() {
        let report = run(open_server, &[]);
        assert_eq!(report.existence, Existence::Exists);
        assert!(report.catch_all_note.is_none());
    }

    #[test]
    fn tempfailed_aliases_keep_target_accepted() {
        let report = run(greylisting_aliases_server, &["zq8w3kx1"]);
        assert_eq!(report.existence, Existence::Exists);
        assert_eq!(
            report.catch_all_note.as_deref(),
            Some("temporary failure on catch-all probes")
        );
    }

    #[test]
    fn rejected_target_does_not_exist() {
        let report = run(rejecting_server, &["zq8w3kx1"]);
        assert_eq!(report.existence, Existence::DoesNotExist);
    }

    #[test]
    fn tempfail_is_indeterminate() {
        let report = run(greylisting_server, &[]);
        assert!(matches!(report.existence, Existence::Indeterminate(ref r) if r.contains("451")));
    }

    #[test]
    fn connection_refused_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let candidate = HostCandidate {
            host: "gone.test".to_string(),
            preference: 0,
            addresses: vec![addr],
        };
        let connector = TlsConnector::new().unwrap();
        let err = probe_host(
            &candidate,
            &TargetAddress {
                local: "a",
                domain: "example.com",
            },
            &SmtpProbeOptions::default(),
            &connector,
            "",
            "localhost",
            &[],
        )
        .err()
        .expect("nothing listens");
        assert!(matches!(err, SmtpVerifyError::Connect { .. }));
    }
}
