//! Subcommands. User-facing output goes to stdout.

use std::io::{self, Write};

use anyhow::Result;
use clap::Subcommand;
use tokio::sync::broadcast;
use tunneldeck_core::auth::Session;
use tunneldeck_core::models::{Tunnel, User};
use tunneldeck_core::{SessionEvent, Tunneldeck};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the logged-in user
    Whoami,
    /// List all tunnels
    Tunnels,
    /// Show one tunnel and its DNS records
    Tunnel { id: String },
    /// Create a tunnel
    CreateTunnel { name: String },
    /// Delete a tunnel
    DeleteTunnel { id: String },
    /// Route a domain to a tunnel
    Dns { id: String, domain: String },
    /// Start a tunnel service
    Start { id: String },
    /// Stop a tunnel service
    Stop { id: String },
    /// Restart a tunnel service
    Restart { id: String },
    /// List all users (superadmin only)
    Users,
    /// Search users by name
    SearchUsers { query: String },
    /// Keep the session alive and report renewals until interrupted
    Watch,
}

pub async fn run(command: Command, deck: &Tunneldeck) -> Result<()> {
    let api = deck.api();
    let mut out = io::stdout();

    match command {
        Command::Whoami => {
            let user = api.my_data().await?;
            print_users(&mut out, &[user])?;
            print_session(&mut out, &deck.session().snapshot())?;
        }
        Command::Tunnels => {
            let tunnels = api.list_tunnels().await?;
            print_tunnels(&mut out, &tunnels)?;
        }
        Command::Tunnel { id } => {
            let tunnel = api.tunnel(&id).await?;
            print_tunnel_detail(&mut out, &tunnel)?;
        }
        Command::CreateTunnel { name } => {
            let tunnel = api.create_tunnel(&name).await?;
            writeln!(out, "Created tunnel {} ({})", tunnel.name, tunnel.id)?;
        }
        Command::DeleteTunnel { id } => {
            api.delete_tunnel(&id).await?;
            writeln!(out, "Deleted tunnel {}", id)?;
        }
        Command::Dns { id, domain } => {
            let tunnel = api.create_dns_record(&id, &domain).await?;
            writeln!(out, "Routed {} to tunnel {}", domain, tunnel.name)?;
        }
        Command::Start { id } => {
            api.start_tunnel(&id).await?;
            writeln!(out, "Started tunnel {}", id)?;
        }
        Command::Stop { id } => {
            api.stop_tunnel(&id).await?;
            writeln!(out, "Stopped tunnel {}", id)?;
        }
        Command::Restart { id } => {
            api.restart_tunnel(&id).await?;
            writeln!(out, "Restarted tunnel {}", id)?;
        }
        Command::Users => {
            let users = api.all_users().await?;
            print_users(&mut out, &users)?;
        }
        Command::SearchUsers { query } => {
            let users = api.search_users(&query).await?;
            print_users(&mut out, &users)?;
        }
        Command::Watch => {
            let scheduler = deck.scheduler();
            writeln!(
                out,
                "Keeping session alive, renewing every {}s. Press Ctrl-C to exit.",
                scheduler.interval().as_secs()
            )?;

            let mut events = deck.subscribe();
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);
            loop {
                tokio::select! {
                    result = &mut ctrl_c => {
                        result?;
                        break;
                    }
                    event = events.recv() => match event {
                        Ok(SessionEvent::Renewed) => {
                            write!(out, "Renewal {}: ", scheduler.attempts())?;
                            print_session(&mut out, &deck.session().snapshot())?;
                        }
                        Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        }
    }

    Ok(())
}

fn print_tunnels(out: &mut impl Write, tunnels: &[Tunnel]) -> io::Result<()> {
    if tunnels.is_empty() {
        return writeln!(out, "No tunnels");
    }
    writeln!(out, "{:<38} {:<24} {}", "ID", "NAME", "CREATED")?;
    for tunnel in tunnels {
        writeln!(out, "{:<38} {:<24} {}", tunnel.id, tunnel.name, tunnel.created_at)?;
    }
    Ok(())
}

fn print_tunnel_detail(out: &mut impl Write, tunnel: &Tunnel) -> io::Result<()> {
    writeln!(out, "{} ({})", tunnel.name, tunnel.id)?;
    writeln!(out, "Created: {}", tunnel.created_at)?;
    if tunnel.dns_records.is_empty() {
        return writeln!(out, "No DNS records");
    }
    writeln!(out, "Hostnames: {}", tunnel.hostnames().join(", "))?;
    for record in &tunnel.dns_records {
        let proxied = if record.proxied { "proxied" } else { "direct" };
        writeln!(out, "  {:<6} {:<40} {} ({})", record.record_type, record.name, record.content, proxied)?;
    }
    Ok(())
}

fn print_session(out: &mut impl Write, session: &Session) -> io::Result<()> {
    match (session.renewed_at, session.credential_age()) {
        (Some(at), Some(age)) => writeln!(
            out,
            "Credential issued {} ({}s ago)",
            at.format("%Y-%m-%d %H:%M:%S UTC"),
            age.num_seconds()
        ),
        _ => writeln!(out, "No credential"),
    }
}

fn print_users(out: &mut impl Write, users: &[User]) -> io::Result<()> {
    if users.is_empty() {
        return writeln!(out, "No users");
    }
    writeln!(out, "{:<38} {:<24} {}", "UUID", "USERNAME", "ROLE")?;
    for user in users {
        writeln!(out, "{:<38} {:<24} {}", user.uuid, user.username, user.role)?;
    }
    Ok(())
}
