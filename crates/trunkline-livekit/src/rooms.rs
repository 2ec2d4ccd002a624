//! Room service wrapper over the `livekit-api` SDK.

use livekit_api::services::room::RoomClient;

use crate::{LiveKitConfig, LiveKitError};

/// Server-side room operations used by the call pipeline.
pub struct RoomService {
    room_client: RoomClient,
}

impl RoomService {
    pub fn new(config: &LiveKitConfig) -> Self {
        let room_client =
            RoomClient::with_api_key(&config.http_url(), &config.api_key, &config.api_secret);
        Self { room_client }
    }

    /// Deletes a call room, disconnecting every participant. Used by the
    /// agent's `end_call` tool as the terminal transition of a call.
    pub async fn delete_room(&self, name: &str) -> Result<(), LiveKitError> {
        self.room_client
            .delete_room(name)
            .await
            .map_err(|e| LiveKitError::RoomService(e.to_string()))
    }

    /// Returns the number of participants currently in a room, or 0 if the
    /// room does not exist.
    pub async fn participant_count(&self, name: &str) -> Result<u32, LiveKitError> {
        match self.room_client.list_participants(name).await {
            Ok(participants) => Ok(participants.len() as u32),
            Err(_) => Ok(0),
        }
    }
}
