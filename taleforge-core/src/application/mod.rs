mod backend;
mod policy;
mod processor;
mod sink;

pub use backend::{
    parse_action_response, validate_batch, ActionBackend, ActionRequest, ActionResponse,
    BatchError,
};
pub use policy::{authorize_enqueue, EnqueueRequest, PolicyError};
pub use processor::{EventProcessor, InFlight, ProcessorState, ProcessorStep};
pub use sink::{DiceRollView, GameView, PresentationSink, StoryLine, TurnState};
