/// Who is driving a mutation. Recorded on every write as `paymentUpdatedBy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    User(String),
    System,
}

impl Actor {
    pub fn audit_label(&self) -> String {
        match self {
            Actor::User(id) => format!("user:{}", id),
            Actor::System => "system".to_string(),
        }
    }
}
