//! Network actor - runs gateway calls in the Tokio async runtime

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::messages::{NetworkCommand, NetworkResponse};
use crate::network::client::Gateway;

/// Network actor that executes gateway commands concurrently and funnels
/// typed responses back to the app layer
pub struct NetworkActor {
    gateway: Gateway,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<()>,
}

impl NetworkActor {
    pub fn new(gateway: Gateway, response_tx: mpsc::UnboundedSender<NetworkResponse>) -> Self {
        NetworkActor {
            gateway,
            response_tx,
            active_requests: JoinSet::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::Shutdown) | None => break,
                        Some(cmd) => self.dispatch(cmd),
                    }
                }

                // Clean up completed tasks
                Some(_result) = self.active_requests.join_next() => {}
            }
        }
    }

    fn dispatch(&mut self, cmd: NetworkCommand) {
        let gateway = self.gateway.clone();
        let tx = self.response_tx.clone();

        self.active_requests.spawn(async move {
            let response = execute(&gateway, cmd).await;
            if let Some(response) = response {
                let _ = tx.send(response);
            }
        });
    }
}

/// Run one command against the gateway and shape the typed response
async fn execute(gateway: &Gateway, cmd: NetworkCommand) -> Option<NetworkResponse> {
    Some(match cmd {
        NetworkCommand::Register { id, email, password } => {
            tracing::info!(id, "registering account");
            match gateway.register(&email, &password).await {
                Ok(()) => NetworkResponse::Registered { id },
                Err(error) => NetworkResponse::Failed { id, error },
            }
        }
        NetworkCommand::Authenticate { id, email, password } => {
            tracing::info!(id, "authenticating");
            match gateway.authenticate(&email, &password).await {
                Ok((credential, tier)) => NetworkResponse::SessionEstablished { id, credential, tier },
                Err(error) => NetworkResponse::Failed { id, error },
            }
        }
        NetworkCommand::AuthenticateGoogle { id, id_token } => {
            tracing::info!(id, "authenticating via external identity");
            match gateway.authenticate_google(&id_token).await {
                Ok((credential, tier)) => NetworkResponse::SessionEstablished { id, credential, tier },
                Err(error) => NetworkResponse::Failed { id, error },
            }
        }
        NetworkCommand::RequestPasswordReset { id, email } => {
            match gateway.request_password_reset(&email).await {
                Ok(()) => NetworkResponse::ResetRequested { id },
                Err(error) => NetworkResponse::Failed { id, error },
            }
        }
        NetworkCommand::ResetPassword { id, token, new_password } => {
            match gateway.reset_password(&token, &new_password).await {
                Ok(()) => NetworkResponse::PasswordChanged { id },
                Err(error) => NetworkResponse::Failed { id, error },
            }
        }
        NetworkCommand::FetchTiers { id } => match gateway.list_tiers().await {
            Ok(tiers) => NetworkResponse::Tiers { id, tiers },
            Err(error) => NetworkResponse::Failed { id, error },
        },
        NetworkCommand::FetchGenres { id, credential } => match gateway.list_genres(&credential).await {
            Ok(genres) => NetworkResponse::Genres { id, genres },
            Err(error) => NetworkResponse::Failed { id, error },
        },
        NetworkCommand::FetchUsage { id, credential } => match gateway.get_usage(&credential).await {
            Ok(usage) => NetworkResponse::Usage { id, usage },
            Err(error) => NetworkResponse::Failed { id, error },
        },
        NetworkCommand::FetchHistory { id, credential } => match gateway.get_history(&credential).await {
            Ok(entries) => NetworkResponse::History { id, entries },
            Err(error) => NetworkResponse::Failed { id, error },
        },
        NetworkCommand::FetchStandards { id } => match gateway.get_standards().await {
            Ok(text) => NetworkResponse::Standards { id, text },
            Err(error) => NetworkResponse::Failed { id, error },
        },
        NetworkCommand::Upload { id, credential, request } => {
            tracing::info!(id, file = %request.file_path.display(), "uploading manuscript");
            match gateway.upload(&credential, &request).await {
                Ok(file_id) => {
                    tracing::info!(id, file_id, "upload accepted");
                    NetworkResponse::Uploaded { id, file_id }
                }
                Err(error) => NetworkResponse::Failed { id, error },
            }
        }
        NetworkCommand::Upgrade { id, credential, tier_id } => {
            tracing::info!(id, tier_id, "changing subscription tier");
            match gateway.upgrade(&credential, &tier_id).await {
                Ok(tier) => NetworkResponse::Upgraded { id, tier },
                Err(error) => NetworkResponse::Failed { id, error },
            }
        }
        NetworkCommand::Download { id, credential, file_id, original_filename } => {
            tracing::info!(id, file_id, "downloading formatted file");
            match gateway.download(&credential, &file_id, &original_filename).await {
                Ok(path) => NetworkResponse::Downloaded { id, path },
                Err(error) => NetworkResponse::Failed { id, error },
            }
        }
        NetworkCommand::Shutdown => return None,
    })
}
