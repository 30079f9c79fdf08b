/// Entry of the league's player directory. Only the display name is read by
/// the agenda; accounts themselves are managed elsewhere.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: i64,
    pub team_id: i64,
    pub display_name: String,
}

/// Identity of the player issuing a request, as established by the session
/// layer. Passed explicitly into every event service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerContext {
    pub player_id: i64,
    pub team_id: i64,
}

impl PlayerContext {
    pub fn new(player_id: i64, team_id: i64) -> Self {
        Self { player_id, team_id }
    }
}
