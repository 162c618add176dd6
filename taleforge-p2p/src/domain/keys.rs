use taleforge_core::PeerId;
use uuid::Uuid;

/// Shared event queue
pub const EVENT_QUEUE: &str = "event_queue";

/// Current host lease
pub const HOST_LEASE: &str = "host_lease";

/// Current vote session (title, options, visibility)
pub const VOTE_STATE: &str = "vote";

const BALLOT_PREFIX: &str = "vote/";

/// Prefix shared by all ballots of one vote session
pub fn ballot_prefix(vote_id: Uuid) -> String {
    format!("{}{}/", BALLOT_PREFIX, vote_id)
}

/// Key of one peer's ballot in one vote session
pub fn ballot_key(vote_id: Uuid, peer: PeerId) -> String {
    format!("{}{}", ballot_prefix(vote_id), peer)
}

/// Parse a ballot key back into (vote session, voter)
pub fn parse_ballot_key(key: &str) -> Option<(Uuid, PeerId)> {
    let rest = key.strip_prefix(BALLOT_PREFIX)?;
    let (vote_id, peer) = rest.split_once('/')?;
    Some((
        Uuid::parse_str(vote_id).ok()?,
        PeerId::from_uuid(Uuid::parse_str(peer).ok()?),
    ))
}
