//! Splits a thread into maximal runs of same-sender messages.

use super::message::{Message, Role};

/// A contiguous, non-empty run of messages from one sender.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MessageGroup<'a> {
    pub role: Role,
    /// Position of `messages[0]` in the full thread.
    pub first_index: usize,
    pub messages: &'a [Message],
}

impl MessageGroup<'_> {
    /// Thread indices covered by this group.
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.first_index..self.first_index + self.messages.len()
    }
}

/// Partition `messages` into groups, preserving order.
///
/// A new group starts whenever the sender role changes, so adjacent groups
/// never share a role and concatenating every group's slice yields the input.
pub fn group_messages(messages: &[Message]) -> Vec<MessageGroup<'_>> {
    let mut first_index = 0;
    messages
        .chunk_by(|a, b| a.role() == b.role())
        .map(|chunk| {
            let group = MessageGroup {
                role: chunk[0].role(),
                first_index,
                messages: chunk,
            };
            first_index += chunk.len();
            group
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread_from_roles(roles: &[Role]) -> Vec<Message> {
        roles
            .iter()
            .enumerate()
            .map(|(i, role)| match role {
                Role::Human => Message::human(format!("h{i}")),
                Role::Assistant => Message::assistant(format!("a{i}")),
            })
            .collect()
    }

    /// Every role sequence up to `len`, as bit patterns.
    fn all_role_sequences(len: usize) -> Vec<Vec<Role>> {
        (0..1u32 << len)
            .map(|bits| {
                (0..len)
                    .map(|i| {
                        if bits & (1 << i) != 0 {
                            Role::Human
                        } else {
                            Role::Assistant
                        }
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn empty_thread_has_no_groups() {
        assert!(group_messages(&[]).is_empty());
    }

    #[test]
    fn concatenation_reconstructs_input() {
        for len in 0..=6 {
            for roles in all_role_sequences(len) {
                let thread = thread_from_roles(&roles);
                let groups = group_messages(&thread);
                let rebuilt: Vec<Message> = groups
                    .iter()
                    .flat_map(|g| g.messages.iter().cloned())
                    .collect();
                assert_eq!(rebuilt, thread, "roles: {roles:?}");
            }
        }
    }

    #[test]
    fn groups_are_uniform_and_maximal() {
        for len in 1..=6 {
            for roles in all_role_sequences(len) {
                let thread = thread_from_roles(&roles);
                let groups = group_messages(&thread);
                for group in &groups {
                    assert!(!group.messages.is_empty());
                    assert!(group.messages.iter().all(|m| m.role() == group.role));
                }
                for pair in groups.windows(2) {
                    assert_ne!(pair[0].role, pair[1].role, "roles: {roles:?}");
                }
            }
        }
    }

    #[test]
    fn first_index_tracks_thread_position() {
        let thread = thread_from_roles(&[
            Role::Human,
            Role::Assistant,
            Role::Assistant,
            Role::Human,
        ]);
        let groups = group_messages(&thread);
        let starts: Vec<usize> = groups.iter().map(|g| g.first_index).collect();
        assert_eq!(starts, vec![0, 1, 3]);
        assert_eq!(groups[1].indices(), 1..3);
    }
}
