use crate::game::{ClientRole, QuizView, Transition};
use crate::input::{help_text, parse_command, Command};
use crate::rendering::{render_questions, render_results, render_roster};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::{ClientEvent, Question, ServerEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Terminal quiz client connected to the server over a WebSocket
pub struct Client {
    ws: WsStream,
    view: QuizView,
    /// Questions the host will start rounds with
    questions: Vec<Question>,
}

impl Client {
    pub async fn connect(
        server_url: &str,
        role: ClientRole,
        questions: Vec<Question>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Connecting to {}...", server_url);
        let (ws, _) = connect_async(server_url).await?;

        Ok(Client {
            ws,
            view: QuizView::new(role),
            questions,
        })
    }

    async fn send_event(&mut self, event: &ClientEvent) -> Result<(), Box<dyn std::error::Error>> {
        let text = event.to_json()?;
        self.ws.send(Message::text(text)).await?;
        Ok(())
    }

    async fn register(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let event = match &self.view.role {
            ClientRole::Host => ClientEvent::HostConnect,
            ClientRole::Player { requested_name } => ClientEvent::PlayerConnect {
                name: requested_name.clone(),
            },
        };
        self.send_event(&event).await
    }

    fn handle_event(&mut self, event: ServerEvent) -> Transition {
        let transition = self.view.apply(&event);

        match &event {
            ServerEvent::PlayerList { players } => println!("{}", render_roster(players)),
            ServerEvent::GameStarted { questions } => {
                println!("Round started!\n{}", render_questions(questions));
                println!("{}", help_text(&self.view.role));
            }
            ServerEvent::GameEnded { results } => {
                let total = self.view.questions.len().max(self.questions.len());
                println!("{}", render_results(results, total));
                if let Some(own) = self.view.own_result() {
                    println!("You scored {}", own.score);
                }
            }
            ServerEvent::PlayerNameConfirmed { name } => println!("Joined as {}", name),
            ServerEvent::ForceDisconnect => println!("The host reset the game, disconnecting"),
        }

        transition
    }

    /// Executes a typed command; returns false when the client should stop
    async fn handle_command(&mut self, command: Command) -> Result<bool, Box<dyn std::error::Error>> {
        match command {
            Command::StartGame => {
                let questions = self.questions.clone();
                info!("Starting round with {} questions", questions.len());
                self.send_event(&ClientEvent::StartGame { questions }).await?;
            }
            Command::EndGame => self.send_event(&ClientEvent::EndGame).await?,
            Command::ResetGame => self.send_event(&ClientEvent::ResetGame).await?,
            Command::Answer { index, answer } => {
                let Some(name) = self.view.name.clone() else {
                    warn!("Not joined yet, answer not sent");
                    return Ok(true);
                };
                if !self.view.record_answer(index, &answer) {
                    println!("No question {} in the current round", index + 1);
                    return Ok(true);
                }
                self.send_event(&ClientEvent::SubmitAnswer {
                    player_name: name,
                    question_index: index,
                    answer,
                })
                .await?;
                if let Some(next) = self.view.next_unanswered() {
                    debug!("Next unanswered question: {}", next + 1);
                }
            }
            Command::Help => println!("{}", help_text(&self.view.role)),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.register().await?;
        println!("{}", help_text(&self.view.role));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                frame = self.ws.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => match ServerEvent::from_json(text.as_str()) {
                            Ok(event) => {
                                if self.handle_event(event) == Transition::Disconnected {
                                    break;
                                }
                            }
                            Err(e) => warn!("{}", e),
                        },
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Server closed the connection");
                            return Ok(());
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                    }
                },

                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match parse_command(&self.view.role, &line) {
                        Some(command) => {
                            if !self.handle_command(command).await? {
                                break;
                            }
                        }
                        None => println!("{}", help_text(&self.view.role)),
                    }
                },
            }
        }

        let _ = self.ws.close(None).await;
        Ok(())
    }
}
