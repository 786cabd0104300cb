use crate::models::message::ChatMessage;

#[derive(Debug)]
pub enum ChatEvent {
    NewChatMessage(ChatMessage),
}
