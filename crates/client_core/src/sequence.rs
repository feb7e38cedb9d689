use std::fmt;

/// Identifies one submission. Later submissions always carry larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmissionTicket(u64);

impl SubmissionTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubmissionTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out tickets and decides whether a finished submission may still be shown.
#[derive(Debug, Default)]
pub struct SubmissionTracker {
    latest: u64,
}

impl SubmissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> SubmissionTicket {
        self.latest += 1;
        SubmissionTicket(self.latest)
    }

    pub fn latest(&self) -> Option<SubmissionTicket> {
        (self.latest > 0).then_some(SubmissionTicket(self.latest))
    }

    pub fn is_latest(&self, ticket: SubmissionTicket) -> bool {
        ticket.0 == self.latest
    }
}
