mod delivery_steps;
mod host_handoff_steps;
mod ordering_steps;
mod session_steps;
mod voting_steps;
