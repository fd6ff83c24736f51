pub mod channel;
pub mod id;
pub mod poll;

pub use channel::Channel;
pub use id::{ChannelId, ChoiceId, QuestionId};
pub use poll::{Choice, Question};
