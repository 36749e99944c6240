use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::engine::analytics::fetch_analytics;
use crate::engine::lifecycle::{
    accept_order, complete_order, confirm_delivery, confirm_pickup, decline_order, load_orders,
    start_delivery,
};
use crate::engine::projection::{ListTab, OrderCard};
use crate::engine::tracking::{start_tracking, FixedPosition, ReplayPositions, TrackerStats};
use crate::error::{AppError, AppResult};
use crate::models::analytics::DateWindow;
use crate::models::order::Order;
use crate::models::rider::{Availability, GeoPoint, ProfileUpdate};
use crate::state::AppState;
use crate::storage::Theme;

#[derive(Debug, Parser)]
#[command(name = "rider", about = "Delivery rider client")]
pub struct Cli {
    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Dump prometheus metrics after the command finishes.
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Email a login code (defaults to the signed-in rider's email).
    SendOtp {
        #[arg(long)]
        email: Option<String>,
    },
    /// Confirm sign-in with the emailed code.
    VerifyOtp {
        #[arg(long)]
        code: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Refresh and show the rider profile.
    Me,
    Logout,
    ProfileUpdate(ProfileArgs),
    /// Go online or offline.
    Availability {
        #[arg(value_parser = clap::value_parser!(Availability))]
        status: Availability,
    },
    /// List assigned orders.
    Orders {
        #[arg(long, value_enum)]
        tab: Option<TabArg>,
        #[command(flatten)]
        here: PositionArgs,
    },
    Show {
        id: String,
    },
    Accept {
        id: String,
    },
    Decline {
        id: String,
    },
    Pickup {
        id: String,
    },
    Start {
        id: String,
    },
    /// Confirm delivery with the customer's code.
    Deliver {
        id: String,
        #[arg(long)]
        otp: String,
    },
    Complete {
        id: String,
    },
    Analytics(AnalyticsArgs),
    /// Report position periodically until interrupted.
    Track(TrackArgs),
    /// Show or change stored preferences.
    Prefs {
        #[arg(long, value_parser = clap::value_parser!(Theme))]
        theme: Option<Theme>,
        #[arg(long, conflicts_with = "theme")]
        toggle_theme: bool,
        #[arg(long)]
        language: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TabArg {
    Pending,
    Active,
    Complete,
    Other,
}

impl From<TabArg> for ListTab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::Pending => ListTab::Pending,
            TabArg::Active => ListTab::Active,
            TabArg::Complete => ListTab::Complete,
            TabArg::Other => ListTab::Other,
        }
    }
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub full_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(Debug, Args)]
pub struct PositionArgs {
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,
}

impl PositionArgs {
    fn point(&self) -> Option<GeoPoint> {
        Some(GeoPoint {
            lat: self.lat?,
            lng: self.lng?,
        })
    }
}

#[derive(Debug, Args)]
pub struct AnalyticsArgs {
    #[arg(long, conflicts_with_all = ["week", "month", "from"])]
    pub day: Option<NaiveDate>,
    #[arg(long, conflicts_with_all = ["month", "from"])]
    pub week: Option<NaiveDate>,
    #[arg(long, conflicts_with = "from")]
    pub month: Option<NaiveDate>,
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,
}

impl AnalyticsArgs {
    /// Defaults to today when no window is given.
    pub fn window(&self, today: NaiveDate) -> AppResult<DateWindow> {
        match (self.day, self.week, self.month, self.from, self.to) {
            (Some(day), ..) => Ok(DateWindow::day(day)),
            (_, Some(week), ..) => Ok(DateWindow::week_of(week)),
            (_, _, Some(month), ..) => Ok(DateWindow::month_of(month)),
            (_, _, _, Some(from), Some(to)) => DateWindow::range(from, to),
            _ => Ok(DateWindow::day(today)),
        }
    }
}

#[derive(Debug, Args)]
pub struct TrackArgs {
    #[command(flatten)]
    pub at: PositionArgs,
    /// JSON file with a list of {"lat", "lng"} points to replay.
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    pub replay: Option<PathBuf>,
    #[arg(long)]
    pub interval_secs: Option<u64>,
    /// Stop after this many seconds instead of waiting for Ctrl-C.
    #[arg(long)]
    pub duration_secs: Option<u64>,
}

/// Window bounds are UTC, so "today" is the UTC date as well.
fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce() -> String) -> AppResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", human());
    }
    Ok(())
}

fn card_line(card: &OrderCard) -> String {
    let mut line = format!(
        "{:<6} {:<16} {:<18} {} -> {}  {}",
        card.tag,
        card.projection.badge.label,
        card.customer_name,
        card.pickup,
        card.drop_off,
        card.delivery_price
    );
    if let Some(distance) = &card.distance {
        line.push_str(&format!("  ({distance})"));
    }
    if let Some(batch) = &card.batch_id {
        line.push_str(&format!("  [batch {batch}]"));
    }
    line
}

fn advanced(json: bool, order: &Order) -> AppResult<()> {
    let card = OrderCard::from_order(order, None);
    emit(json, &card, || {
        format!(
            "{} is now {}. Next: {} ({})",
            card.tag,
            card.projection.badge.label,
            card.projection.route.name(),
            card.projection.action_label
        )
    })
}

pub async fn run(cli: Cli, state: &AppState) -> AppResult<()> {
    let json = cli.json;

    match cli.command {
        Command::Login { email, password } => {
            let profile = state.backend.login(&email, &password).await?;
            state.backend.send_login_otp(&email).await?;
            emit(json, &profile, || {
                format!(
                    "Signed in as {}. A login code was sent to {email}; confirm it with `rider verify-otp`.",
                    profile.full_name
                )
            })
        }
        Command::SendOtp { email } => {
            let email = match email {
                Some(email) => email,
                None => state
                    .session
                    .profile()
                    .await
                    .map(|p| p.email)
                    .ok_or(AppError::Unauthenticated)?,
            };
            state.backend.send_login_otp(&email).await?;
            emit(json, &serde_json::json!({ "sent": email }), || {
                format!("Code sent to {email}")
            })
        }
        Command::VerifyOtp { code, email } => {
            let contact = match email {
                Some(email) => email,
                None => state
                    .session
                    .profile()
                    .await
                    .map(|p| p.email)
                    .ok_or(AppError::Unauthenticated)?,
            };
            state.backend.verify_login_otp(&contact, &code).await?;
            emit(json, &serde_json::json!({ "verified": true }), || {
                "Code accepted. You're signed in.".to_string()
            })
        }
        Command::Me => {
            let profile = state.backend.me().await?;
            state.session.set_profile(profile.clone()).await?;
            emit(json, &profile, || {
                format!(
                    "{}\n{}\n{}\n{}",
                    profile.full_name, profile.email, profile.phone_number, profile.address
                )
            })
        }
        Command::Logout => {
            state.backend.logout().await?;
            emit(json, &serde_json::json!({ "signed_out": true }), || {
                "Signed out.".to_string()
            })
        }
        Command::ProfileUpdate(args) => {
            let update = ProfileUpdate {
                full_name: args.full_name,
                email: args.email,
                address: args.address,
                phone_number: args.phone,
            };
            let profile = state.backend.update_profile(&update).await?;
            emit(json, &profile, || "Profile updated successfully".to_string())
        }
        Command::Availability { status } => {
            state.backend.set_availability(status).await?;
            emit(json, &serde_json::json!({ "status": status }), || {
                format!("You are now {status}.")
            })
        }
        Command::Orders { tab, here } => {
            load_orders(state).await?;
            let here = here.point();
            let orders = match tab {
                Some(tab) => state.board.by_tab(tab.into()),
                None => state.board.orders(),
            };
            let cards: Vec<OrderCard> = orders
                .iter()
                .map(|order| OrderCard::from_order(order, here.as_ref()))
                .collect();
            let counts = state.board.tab_counts();

            emit(
                json,
                &serde_json::json!({ "counts": counts, "orders": cards }),
                || {
                    let mut out = format!(
                        "Pending {}  Active {}  Complete {}  Other {}\n",
                        counts.pending, counts.active, counts.complete, counts.other
                    );
                    if cards.is_empty() {
                        out.push_str("No orders.");
                    }
                    for card in &cards {
                        out.push_str(&card_line(card));
                        out.push('\n');
                    }
                    out.trim_end().to_string()
                },
            )
        }
        Command::Show { id } => {
            load_orders(state).await?;
            let order = state
                .board
                .get(&id)
                .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
            let card = OrderCard::from_order(&order, None);

            emit(json, &order, || {
                let mut out = format!(
                    "{}\nCustomer: {} {}\nNext: {} ({})\nTotal: {}",
                    card_line(&card),
                    order.customer_name,
                    order.customer_phone_number,
                    card.projection.route.name(),
                    card.projection.action_label,
                    card.delivery_price,
                );
                for product in &order.products {
                    out.push_str(&format!(
                        "\n  {}x {}  {:.2}",
                        product.quantity, product.name, product.price
                    ));
                }
                out
            })
        }
        Command::Accept { id } => {
            load_orders(state).await?;
            advanced(json, &accept_order(state, &id).await?)
        }
        Command::Decline { id } => {
            load_orders(state).await?;
            advanced(json, &decline_order(state, &id).await?)
        }
        Command::Pickup { id } => {
            load_orders(state).await?;
            advanced(json, &confirm_pickup(state, &id).await?)
        }
        Command::Start { id } => {
            load_orders(state).await?;
            advanced(json, &start_delivery(state, &id).await?)
        }
        Command::Deliver { id, otp } => {
            load_orders(state).await?;
            advanced(json, &confirm_delivery(state, &id, &otp).await?)
        }
        Command::Complete { id } => {
            load_orders(state).await?;
            advanced(json, &complete_order(state, &id).await?)
        }
        Command::Analytics(args) => {
            let window = args.window(utc_today())?;
            let summary = fetch_analytics(state, window).await?;
            emit(json, &summary, || {
                format!(
                    "{} to {}\nEarnings: {:.2} GH₵\nOrders: {}\nHours: {}\nAvg delivery: {:.2} h\nPending {}  Active {}  Complete {}  Failed {}",
                    summary.window.start.date_naive(),
                    summary.window.end.date_naive(),
                    summary.total_earnings,
                    summary.total_orders,
                    summary.total_hours,
                    summary.average_delivery_hours,
                    summary.breakdown.pending,
                    summary.breakdown.active,
                    summary.breakdown.complete,
                    summary.breakdown.failed,
                )
            })
        }
        Command::Track(args) => {
            let every = args
                .interval_secs
                .map(Duration::from_secs)
                .unwrap_or(state.config.location_interval);
            let backend = state.backend.clone();

            let handle = match (&args.replay, args.at.point()) {
                (Some(path), _) => {
                    start_tracking(backend, ReplayPositions::from_file(path).await?, every).await?
                }
                (None, Some(point)) => {
                    start_tracking(backend, FixedPosition::new(point), every).await?
                }
                (None, None) => {
                    return Err(AppError::Validation(
                        "give --lat/--lng or --replay".to_string(),
                    ));
                }
            };

            match args.duration_secs {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => {
                    if let Err(err) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %err, "failed to listen for shutdown signal");
                    }
                }
            }

            let stats: TrackerStats = handle.stop().await;
            emit(json, &stats, || {
                format!(
                    "Sent {} location update(s), {} failed, {} skipped",
                    stats.sent, stats.failed, stats.skipped
                )
            })
        }
        Command::Prefs {
            theme,
            toggle_theme,
            language,
        } => {
            if toggle_theme {
                let current = state.session.snapshot().await.theme;
                state.session.set_theme(current.toggled()).await?;
            } else if let Some(theme) = theme {
                state.session.set_theme(theme).await?;
            }
            if let Some(language) = language {
                state.session.set_language(&language).await?;
            }

            let snapshot = state.session.snapshot().await;
            let prefs = serde_json::json!({
                "theme": snapshot.theme,
                "language": snapshot.language,
                "device_id": snapshot.device_id,
            });
            emit(json, &prefs, || {
                format!(
                    "theme: {:?}\nlanguage: {}",
                    snapshot.theme, snapshot.language
                )
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rider").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parses_orders_with_tab_and_position() {
        let cli = parse(&["orders", "--tab", "active", "--lat", "5.6", "--lng", "-0.18"]);
        match cli.command {
            Command::Orders { tab, here } => {
                assert!(matches!(tab, Some(TabArg::Active)));
                assert_eq!(here.point(), Some(GeoPoint { lat: 5.6, lng: -0.18 }));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn deliver_requires_otp() {
        assert!(Cli::try_parse_from(["rider", "deliver", "o1"]).is_err());
        let cli = parse(&["deliver", "o1", "--otp", "1234", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn availability_parses_from_text() {
        let cli = parse(&["availability", "offline"]);
        assert!(matches!(
            cli.command,
            Command::Availability {
                status: Availability::Offline
            }
        ));
    }

    #[test]
    fn analytics_window_selection() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();

        let Command::Analytics(args) = parse(&["analytics", "--week", "2024-05-15"]).command else {
            panic!("expected analytics");
        };
        let window = args.window(today).unwrap();
        assert_eq!(
            window.start.date_naive(),
            NaiveDate::from_ymd_opt(2024, 5, 13).unwrap()
        );

        let Command::Analytics(args) = parse(&["analytics"]).command else {
            panic!("expected analytics");
        };
        assert_eq!(args.window(today).unwrap(), DateWindow::day(today));

        assert!(Cli::try_parse_from(["rider", "analytics", "--from", "2024-05-01"]).is_err());
    }

    #[test]
    fn default_window_covers_the_current_instant() {
        let Command::Analytics(args) = parse(&["analytics"]).command else {
            panic!("expected analytics");
        };
        let window = args.window(utc_today()).unwrap();
        assert!(window.contains(Utc::now()));
    }

    #[test]
    fn prefs_theme_and_toggle_conflict() {
        assert!(
            Cli::try_parse_from(["rider", "prefs", "--theme", "dark", "--toggle-theme"]).is_err()
        );
    }
}
