// ============================
// portfolio-backend-lib/src/chat.rs
// ============================
//! The chat room: membership registry and broadcast fan-out.
use dashmap::DashMap;
use metrics::{counter, gauge};
use portfolio_common::{ChatServerEvent, Role, StyleClass, MAIN_ROOM};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::metrics::{CHAT_DROPPED, CHAT_MESSAGE, CHAT_PARTICIPANTS};

pub type ParticipantId = Uuid;

/// Outgoing queue depth per participant
const CHANNEL_CAPACITY: usize = 32;

/// Who is on the other end of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub role: Role,
}

impl Participant {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    fn tagged(&self) -> String {
        format!("{} ({})", self.name, self.role.chat_tag())
    }
}

struct Member {
    participant: Participant,
    tx: mpsc::Sender<ChatServerEvent>,
}

/// A single broadcast room
///
/// Everyone connected receives every broadcast, the sender included.
/// Delivery is best effort: a participant whose queue is full or closed
/// simply misses the line.
pub struct ChatRoom {
    name: String,
    members: DashMap<ParticipantId, Member>,
}

impl Default for ChatRoom {
    fn default() -> Self {
        Self::new(MAIN_ROOM)
    }
}

impl ChatRoom {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.members.contains_key(&id)
    }

    /// Register a connection so it receives broadcasts, without announcing it
    pub fn connect(&self, participant: Participant) -> (ParticipantId, mpsc::Receiver<ChatServerEvent>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let id = Uuid::new_v4();
        self.members.insert(id, Member { participant, tx });
        gauge!(CHAT_PARTICIPANTS).set(self.members.len() as f64);
        debug!(room = %self.name, %id, "participant connected");
        (id, rx)
    }

    /// Register and announce in one step
    pub fn join(&self, participant: Participant) -> (ParticipantId, mpsc::Receiver<ChatServerEvent>) {
        let (id, rx) = self.connect(participant);
        self.announce_join(id);
        (id, rx)
    }

    /// Tell the room that `id` has entered. Returns the number of recipients.
    pub fn announce_join(&self, id: ParticipantId) -> usize {
        let Some(participant) = self.participant(id) else {
            return 0;
        };
        self.broadcast(ChatServerEvent::Status {
            msg: format!("{} has entered the room.", participant.tagged()),
            class: StyleClass::SystemMessage,
        })
    }

    /// Broadcast a line of chat from `id`. Returns the number of recipients.
    pub fn say(&self, id: ParticipantId, text: &str) -> usize {
        let Some(participant) = self.participant(id) else {
            return 0;
        };
        counter!(CHAT_MESSAGE).increment(1);
        self.broadcast(ChatServerEvent::Status {
            msg: format!("{}: {}", participant.tagged(), text),
            class: participant.role.message_class(),
        })
    }

    /// Announce the departure, then remove `id` from the room
    pub fn leave(&self, id: ParticipantId) -> usize {
        let Some(participant) = self.participant(id) else {
            return 0;
        };
        let delivered = self.broadcast(ChatServerEvent::Status {
            msg: format!("{} has left the room.", participant.tagged()),
            class: StyleClass::SystemMessage,
        });
        self.disconnect(id);
        delivered
    }

    /// Remove `id` without telling anyone
    pub fn disconnect(&self, id: ParticipantId) {
        if self.members.remove(&id).is_some() {
            gauge!(CHAT_PARTICIPANTS).set(self.members.len() as f64);
            debug!(room = %self.name, %id, "participant removed");
        }
    }

    /// Send an event to one participant only
    pub fn send_to(&self, id: ParticipantId, event: ChatServerEvent) -> bool {
        let tx = match self.members.get(&id) {
            Some(member) => member.tx.clone(),
            None => return false,
        };
        deliver(&tx, event)
    }

    /// Fan an event out to a snapshot of the current members
    pub fn broadcast(&self, event: ChatServerEvent) -> usize {
        let recipients: Vec<mpsc::Sender<ChatServerEvent>> =
            self.members.iter().map(|m| m.tx.clone()).collect();

        recipients
            .iter()
            .filter(|tx| deliver(tx, event.clone()))
            .count()
    }

    fn participant(&self, id: ParticipantId) -> Option<Participant> {
        self.members.get(&id).map(|m| m.participant.clone())
    }
}

fn deliver(tx: &mpsc::Sender<ChatServerEvent>, event: ChatServerEvent) -> bool {
    match tx.try_send(event) {
        Ok(()) => true,
        Err(e) => {
            counter!(CHAT_DROPPED).increment(1);
            debug!(error = %e, "dropped chat event");
            false
        },
    }
}
