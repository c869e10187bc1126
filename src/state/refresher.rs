use crate::state::messages::NetworkRequest;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Re-fetches the open tournament's schedule so results show up without a
/// reload. Runs for as long as the league stays open.
pub struct PeriodicRefresher {
    network_requests: mpsc::Sender<NetworkRequest>,
    tournament: String,
    period: Duration,
}

impl PeriodicRefresher {
    pub fn new(
        network_requests: mpsc::Sender<NetworkRequest>,
        tournament: String,
        period: Duration,
    ) -> Self {
        Self { network_requests, tournament, period }
    }

    pub async fn run(self) {
        let mut schedule_interval = interval(self.period);
        // The league was just loaded; skip the immediate tick.
        schedule_interval.tick().await;

        loop {
            schedule_interval.tick().await;
            let request = NetworkRequest::RefreshSchedule { tournament: self.tournament.clone() };
            if self.network_requests.send(request).await.is_err() {
                break;
            }
        }
    }
}
