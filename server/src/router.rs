//! Dispatch of inbound client events to session handlers
//!
//! Handlers run synchronously against the session and the connection
//! registry, then announce the new state through the delivery layer.

use crate::client_manager::{ClientManager, ConnectionId};
use crate::game::{AnswerOutcome, Role, Session};
use log::{debug, info};
use shared::{ClientEvent, Question, ServerEvent};

/// Routes one inbound event from a connection to its handler
pub fn dispatch(session: &mut Session, clients: &mut ClientManager, from: ConnectionId, event: ClientEvent) {
    match event {
        ClientEvent::HostConnect => host_connect(session, clients, from),
        ClientEvent::PlayerConnect { name } => player_connect(session, clients, from, &name),
        ClientEvent::StartGame { questions } => {
            if require_host(session, from, "start_game") {
                start_game(session, clients, questions);
            }
        }
        ClientEvent::SubmitAnswer {
            player_name,
            question_index,
            answer,
        } => submit_answer(session, clients, from, &player_name, question_index, answer),
        ClientEvent::EndGame => {
            if require_host(session, from, "end_game") {
                end_game(session, clients);
            }
        }
        ClientEvent::ResetGame => {
            if require_host(session, from, "reset_game") {
                reset_game(session, clients);
            }
        }
        ClientEvent::Unknown => {
            debug!("Ignoring unknown event type from connection {}", from);
        }
    }
}

/// Releases the role held by a closed connection
pub fn disconnect(session: &mut Session, clients: &mut ClientManager, connection_id: ConnectionId) {
    if let Role::Player(_) = session.disconnect(connection_id) {
        announce_players(session, clients);
    }
    clients.remove_client(&connection_id);
}

fn require_host(session: &Session, from: ConnectionId, action: &str) -> bool {
    if session.role_of(from) == Role::Host {
        return true;
    }
    debug!(
        "Ignoring {} from connection {}: not the host",
        action, from
    );
    false
}

fn announce_players(session: &Session, clients: &ClientManager) {
    clients.notify_host(
        session.host(),
        ServerEvent::PlayerList {
            players: session.player_list(),
        },
    );
}

fn host_connect(session: &mut Session, clients: &mut ClientManager, from: ConnectionId) {
    session.connect_host(from);
    announce_players(session, clients);
}

fn player_connect(session: &mut Session, clients: &mut ClientManager, from: ConnectionId, requested: &str) {
    let Some(name) = session.connect_player(from, requested) else {
        return;
    };

    clients.notify(from, ServerEvent::PlayerNameConfirmed { name });

    // Late joiners get the running round's questions
    if session.is_active() {
        clients.notify(
            from,
            ServerEvent::GameStarted {
                questions: session.player_questions(),
            },
        );
    }

    announce_players(session, clients);
}

fn start_game(session: &mut Session, clients: &mut ClientManager, questions: Vec<Question>) {
    session.start(questions);

    let questions = session.player_questions();
    let sent = clients.notify_players(&session.player_connections(), |_| ServerEvent::GameStarted {
        questions: questions.clone(),
    });
    info!("Sent questions to {} players", sent);

    announce_players(session, clients);
}

fn submit_answer(
    session: &mut Session,
    clients: &mut ClientManager,
    from: ConnectionId,
    player_name: &str,
    question_index: usize,
    answer: String,
) {
    match session.role_of(from) {
        Role::Player(name) if name == player_name => {}
        role => {
            debug!(
                "Ignoring answer for {} from connection {} holding {:?}",
                player_name, from, role
            );
            return;
        }
    }

    if session.submit_answer(player_name, question_index, answer) == AnswerOutcome::RoundComplete {
        info!("All players finished, ending round");
        end_game(session, clients);
    }
}

fn end_game(session: &mut Session, clients: &mut ClientManager) {
    let results = session.end().to_vec();
    let reached = clients.broadcast_all(&ServerEvent::GameEnded { results });
    info!("Results delivered to {} connections", reached);
}

fn reset_game(session: &mut Session, clients: &mut ClientManager) {
    for connection_id in session.reset() {
        clients.notify(connection_id, ServerEvent::ForceDisconnect);
        clients.close(connection_id);
    }

    announce_players(session, clients);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_manager::Outgoing;
    use std::net::SocketAddr;
    use tokio::sync::mpsc;

    struct Harness {
        session: Session,
        clients: ClientManager,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                session: Session::new(),
                clients: ClientManager::new(),
            }
        }

        fn connect(&mut self) -> (ConnectionId, mpsc::UnboundedReceiver<Outgoing>) {
            let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
            let (tx, rx) = mpsc::unbounded_channel();
            let id = self.clients.add_client(addr, tx);
            self.clients.mark_open(id);
            (id, rx)
        }

        fn send(&mut self, from: ConnectionId, event: ClientEvent) {
            dispatch(&mut self.session, &mut self.clients, from, event);
        }

        fn answer(&mut self, from: ConnectionId, name: &str, index: usize, answer: &str) {
            self.send(
                from,
                ClientEvent::SubmitAnswer {
                    player_name: name.to_string(),
                    question_index: index,
                    answer: answer.to_string(),
                },
            );
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Outgoing>) -> Vec<Outgoing> {
        let mut items = Vec::new();
        while let Ok(item) = rx.try_recv() {
            items.push(item);
        }
        items
    }

    fn events(rx: &mut mpsc::UnboundedReceiver<Outgoing>) -> Vec<ServerEvent> {
        drain(rx)
            .into_iter()
            .filter_map(|o| match o {
                Outgoing::Event(event) => Some(event),
                Outgoing::Close => None,
            })
            .collect()
    }

    fn player(name: &str) -> ClientEvent {
        ClientEvent::PlayerConnect {
            name: name.to_string(),
        }
    }

    fn one_question() -> Vec<Question> {
        vec![Question::new("2+2?", &["3", "4"], "4")]
    }

    fn roster(names: &[&str]) -> ServerEvent {
        ServerEvent::PlayerList {
            players: names
                .iter()
                .map(|n| shared::PlayerSummary {
                    name: n.to_string(),
                    score: 0,
                })
                .collect(),
        }
    }

    #[test]
    fn test_host_connect_sends_roster() {
        let mut h = Harness::new();
        let (host, mut host_rx) = h.connect();

        h.send(host, ClientEvent::HostConnect);

        assert_eq!(h.session.host(), Some(host));
        assert_eq!(events(&mut host_rx), vec![roster(&[])]);
    }

    #[test]
    fn test_player_connect_confirms_and_updates_host() {
        let mut h = Harness::new();
        let (host, mut host_rx) = h.connect();
        let (ann, mut ann_rx) = h.connect();
        h.send(host, ClientEvent::HostConnect);
        drain(&mut host_rx);

        h.send(ann, player("Ann"));

        assert_eq!(
            events(&mut ann_rx),
            vec![ServerEvent::PlayerNameConfirmed {
                name: "Ann".to_string()
            }]
        );
        assert_eq!(events(&mut host_rx), vec![roster(&["Ann"])]);
    }

    #[test]
    fn test_colliding_player_gets_suffixed_name() {
        let mut h = Harness::new();
        let (first, _first_rx) = h.connect();
        let (second, mut second_rx) = h.connect();

        h.send(first, player("Ann"));
        h.send(second, player("Ann"));

        assert_eq!(
            events(&mut second_rx),
            vec![ServerEvent::PlayerNameConfirmed {
                name: "Ann_1".to_string()
            }]
        );
        assert_eq!(h.session.role_of(second), Role::Player("Ann_1".to_string()));
    }

    #[test]
    fn test_start_game_sends_sanitized_questions_to_players_only() {
        let mut h = Harness::new();
        let (host, mut host_rx) = h.connect();
        let (ann, mut ann_rx) = h.connect();
        let (_idle, mut idle_rx) = h.connect();
        h.send(host, ClientEvent::HostConnect);
        h.send(ann, player("Ann"));
        drain(&mut host_rx);
        drain(&mut ann_rx);

        h.send(
            host,
            ClientEvent::StartGame {
                questions: one_question(),
            },
        );

        let received = events(&mut ann_rx);
        assert_eq!(received.len(), 1);
        let json = received[0].to_json().unwrap();
        assert!(json.contains("\"game_started\""));
        assert!(!json.contains("correct_answer"));

        assert_eq!(events(&mut host_rx), vec![roster(&["Ann"])]);
        assert!(drain(&mut idle_rx).is_empty());
        assert!(h.session.is_active());
    }

    #[test]
    fn test_gameplay_from_non_host_is_ignored() {
        let mut h = Harness::new();
        let (ann, mut ann_rx) = h.connect();
        let (stranger, _stranger_rx) = h.connect();
        h.send(ann, player("Ann"));
        drain(&mut ann_rx);

        h.send(
            stranger,
            ClientEvent::StartGame {
                questions: one_question(),
            },
        );
        h.send(
            ann,
            ClientEvent::StartGame {
                questions: one_question(),
            },
        );
        assert!(!h.session.is_active());

        h.send(stranger, ClientEvent::ResetGame);
        assert_eq!(h.session.player_count(), 1);

        h.send(ann, ClientEvent::EndGame);
        assert!(drain(&mut ann_rx).is_empty());
    }

    #[test]
    fn test_answer_must_come_from_named_player() {
        let mut h = Harness::new();
        let (host, _host_rx) = h.connect();
        let (ann, _ann_rx) = h.connect();
        let (bob, _bob_rx) = h.connect();
        h.send(host, ClientEvent::HostConnect);
        h.send(ann, player("Ann"));
        h.send(bob, player("Bob"));
        h.send(
            host,
            ClientEvent::StartGame {
                questions: one_question(),
            },
        );

        h.answer(bob, "Ann", 0, "4");
        h.answer(host, "Ann", 0, "4");

        assert!(h.session.player("Ann").unwrap().answers.is_empty());
    }

    #[test]
    fn test_answer_while_inactive_is_not_recorded() {
        let mut h = Harness::new();
        let (ann, _ann_rx) = h.connect();
        h.send(ann, player("Ann"));

        h.answer(ann, "Ann", 0, "4");

        assert!(h.session.player("Ann").unwrap().answers.is_empty());
    }

    #[test]
    fn test_full_completion_ends_round_automatically() {
        let mut h = Harness::new();
        let (host, mut host_rx) = h.connect();
        let (ann, mut ann_rx) = h.connect();
        let (bob, mut bob_rx) = h.connect();
        h.send(host, ClientEvent::HostConnect);
        h.send(ann, player("Ann"));
        h.send(bob, player("Bob"));
        h.send(
            host,
            ClientEvent::StartGame {
                questions: one_question(),
            },
        );
        drain(&mut host_rx);
        drain(&mut ann_rx);
        drain(&mut bob_rx);

        h.answer(ann, "Ann", 0, "4");
        assert!(h.session.is_active());
        assert!(events(&mut host_rx).is_empty());

        h.answer(bob, "Bob", 0, "3");
        assert!(!h.session.is_active());

        let expected = ServerEvent::GameEnded {
            results: vec![
                shared::PlayerResult {
                    name: "Ann".to_string(),
                    score: 1,
                    answers: vec![Some("4".to_string())],
                },
                shared::PlayerResult {
                    name: "Bob".to_string(),
                    score: 0,
                    answers: vec![Some("3".to_string())],
                },
            ],
        };
        assert_eq!(events(&mut host_rx), vec![expected.clone()]);
        assert_eq!(events(&mut ann_rx), vec![expected.clone()]);
        assert_eq!(events(&mut bob_rx), vec![expected]);
    }

    #[test]
    fn test_manual_end_broadcasts_to_everyone() {
        let mut h = Harness::new();
        let (host, mut host_rx) = h.connect();
        let (ann, mut ann_rx) = h.connect();
        let (_watcher, mut watcher_rx) = h.connect();
        h.send(host, ClientEvent::HostConnect);
        h.send(ann, player("Ann"));
        h.send(
            host,
            ClientEvent::StartGame {
                questions: one_question(),
            },
        );
        drain(&mut host_rx);
        drain(&mut ann_rx);

        h.send(host, ClientEvent::EndGame);

        let expected = ServerEvent::GameEnded {
            results: vec![shared::PlayerResult {
                name: "Ann".to_string(),
                score: 0,
                answers: vec![],
            }],
        };
        assert_eq!(events(&mut host_rx), vec![expected.clone()]);
        assert_eq!(events(&mut ann_rx), vec![expected.clone()]);
        assert_eq!(events(&mut watcher_rx), vec![expected]);
        assert!(!h.session.is_active());
    }

    #[test]
    fn test_reset_force_disconnects_players_and_keeps_host() {
        let mut h = Harness::new();
        let (host, mut host_rx) = h.connect();
        let (ann, mut ann_rx) = h.connect();
        let (bob, mut bob_rx) = h.connect();
        h.send(host, ClientEvent::HostConnect);
        h.send(ann, player("Ann"));
        h.send(bob, player("Bob"));
        h.send(
            host,
            ClientEvent::StartGame {
                questions: one_question(),
            },
        );
        drain(&mut host_rx);
        drain(&mut ann_rx);
        drain(&mut bob_rx);

        h.send(host, ClientEvent::ResetGame);

        assert_eq!(h.session.player_count(), 0);
        assert!(!h.session.is_active());
        assert_eq!(h.session.host(), Some(host));

        let expected = vec![
            Outgoing::Event(ServerEvent::ForceDisconnect),
            Outgoing::Close,
        ];
        assert_eq!(drain(&mut ann_rx), expected);
        assert_eq!(drain(&mut bob_rx), expected);
        assert_eq!(events(&mut host_rx), vec![roster(&[])]);
    }

    #[test]
    fn test_reset_tolerates_closed_player_connection() {
        let mut h = Harness::new();
        let (host, _host_rx) = h.connect();
        let (ann, ann_rx) = h.connect();
        h.send(host, ClientEvent::HostConnect);
        h.send(ann, player("Ann"));
        drop(ann_rx);

        h.send(host, ClientEvent::ResetGame);

        assert_eq!(h.session.player_count(), 0);
    }

    #[test]
    fn test_closed_connection_after_reset_is_noop() {
        let mut h = Harness::new();
        let (host, mut host_rx) = h.connect();
        let (ann, _ann_rx) = h.connect();
        h.send(host, ClientEvent::HostConnect);
        h.send(ann, player("Ann"));
        h.send(host, ClientEvent::ResetGame);
        drain(&mut host_rx);

        disconnect(&mut h.session, &mut h.clients, ann);

        assert!(drain(&mut host_rx).is_empty());
        assert_eq!(h.clients.state(ann), None);
    }

    #[test]
    fn test_player_disconnect_updates_host() {
        let mut h = Harness::new();
        let (host, mut host_rx) = h.connect();
        let (ann, _ann_rx) = h.connect();
        let (bob, _bob_rx) = h.connect();
        h.send(host, ClientEvent::HostConnect);
        h.send(ann, player("Ann"));
        h.send(bob, player("Bob"));
        drain(&mut host_rx);

        disconnect(&mut h.session, &mut h.clients, ann);

        assert!(h.session.player("Ann").is_none());
        assert_eq!(events(&mut host_rx), vec![roster(&["Bob"])]);
    }

    #[test]
    fn test_host_disconnect_clears_host() {
        let mut h = Harness::new();
        let (host, _host_rx) = h.connect();
        let (ann, mut ann_rx) = h.connect();
        h.send(host, ClientEvent::HostConnect);
        h.send(ann, player("Ann"));
        drain(&mut ann_rx);

        disconnect(&mut h.session, &mut h.clients, host);

        assert_eq!(h.session.host(), None);
        assert_eq!(h.session.player_count(), 1);
        assert!(drain(&mut ann_rx).is_empty());
    }

    #[test]
    fn test_late_joiner_receives_questions() {
        let mut h = Harness::new();
        let (host, _host_rx) = h.connect();
        h.send(host, ClientEvent::HostConnect);
        h.send(
            host,
            ClientEvent::StartGame {
                questions: one_question(),
            },
        );

        let (late, mut late_rx) = h.connect();
        h.send(late, player("Late"));

        assert_eq!(
            events(&mut late_rx),
            vec![
                ServerEvent::PlayerNameConfirmed {
                    name: "Late".to_string()
                },
                ServerEvent::GameStarted {
                    questions: vec![one_question()[0].sanitized()]
                },
            ]
        );
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let mut h = Harness::new();
        let (host, mut host_rx) = h.connect();
        h.send(host, ClientEvent::HostConnect);
        drain(&mut host_rx);

        h.send(host, ClientEvent::Unknown);

        assert!(drain(&mut host_rx).is_empty());
        assert!(!h.session.is_active());
    }
}
