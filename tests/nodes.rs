use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use postscriptum::auth::CredentialStore;
use postscriptum::config::NodeConfig;
use postscriptum::console::Flow;
use postscriptum::node::Node;
use postscriptum::session::{Active, Authenticating};
use postscriptum::store::PoloUserStore;
use postscriptum::types::Message;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(3);
const QUIET: Duration = Duration::from_millis(300);

/// Each node has its own credential database, as separate processes would.
fn logged_in(name: &str, password: &str) -> Active {
    let users = Arc::new(PoloUserStore::open_memory().expect("open store"));
    let auth = Authenticating::new(CredentialStore::with_rounds(users, 1_000));
    auth.register(name, password).expect("register");
    auth.login(name, password).expect("login")
}

async fn start_node(user: Active) -> Result<(Node, mpsc::UnboundedReceiver<Message>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let node = Node::start(&NodeConfig::local(0), user, Arc::new(tx)).await?;
    Ok((node, rx))
}

fn type_line(node: &Node, line: &str) -> Result<(String, Flow)> {
    let mut out = Vec::new();
    let flow = node.chat().handle(line, &mut out)?;
    Ok((String::from_utf8(out)?, flow))
}

#[tokio::test]
async fn bob_reaches_alice() -> Result<()> {
    let (alice, mut alice_inbox) = start_node(logged_in("alice", "secret")).await?;
    let (bob, mut bob_inbox) = start_node(logged_in("bob", "hunter2")).await?;

    type_line(&bob, &format!("/connect {}", alice.local_addr()))?;
    let (echo, flow) = type_line(&bob, "hello")?;
    assert_eq!(flow, Flow::Continue);
    assert!(echo.contains("[bob]"));

    let got = timeout(WAIT, alice_inbox.recv()).await?.expect("alice inbox open");
    assert_eq!(got, Message::new("bob", "hello"));

    // Exactly one delivery, and bob does not hear himself.
    assert!(timeout(QUIET, alice_inbox.recv()).await.is_err());
    assert!(timeout(QUIET, bob_inbox.recv()).await.is_err());
    Ok(())
}

#[tokio::test]
async fn peers_listing() -> Result<()> {
    let (node, _inbox) = start_node(logged_in("carol", "pw")).await?;

    let (out, _) = type_line(&node, "/peers")?;
    assert!(out.contains("(no peers)"));

    type_line(&node, "/connect 1.2.3.4:1")?;
    let (out, _) = type_line(&node, "/peers")?;
    assert!(out.contains("1.2.3.4:1"));
    assert_eq!(node.peers().snapshot(), vec!["1.2.3.4:1"]);
    Ok(())
}

#[tokio::test]
async fn malformed_bytes_do_not_stop_the_listener() -> Result<()> {
    let (node, mut inbox) = start_node(logged_in("alice", "pw")).await?;
    let addr = node.local_addr();

    let mut bad = TcpStream::connect(addr).await?;
    bad.write_all(&[0xff, 0xfe, b'{', b'}', b'\n']).await?;
    bad.shutdown().await?;
    drop(bad);
    assert!(timeout(QUIET, inbox.recv()).await.is_err());

    let mut good = TcpStream::connect(addr).await?;
    good.write_all(b"{\"from\":\"dave\",\"content\":\"ok\"}\n").await?;
    drop(good);

    let got = timeout(WAIT, inbox.recv()).await?.expect("inbox open");
    assert_eq!(got, Message::new("dave", "ok"));
    Ok(())
}

#[tokio::test]
async fn unreachable_peer_does_not_affect_reachable_one() -> Result<()> {
    let dead = {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        listener.local_addr()?
    };
    let (alice, mut alice_inbox) = start_node(logged_in("alice", "pw")).await?;
    let (bob, _) = start_node(logged_in("bob", "pw")).await?;

    bob.peers().add(dead.to_string());
    bob.peers().add(alice.local_addr().to_string());
    let (_, flow) = type_line(&bob, "anyone there?")?;
    assert_eq!(flow, Flow::Continue);

    let got = timeout(WAIT, alice_inbox.recv()).await?.expect("inbox open");
    assert_eq!(got, Message::new("bob", "anyone there?"));
    Ok(())
}

#[tokio::test]
async fn quit_ends_the_session() -> Result<()> {
    let (node, _inbox) = start_node(logged_in("erin", "pw")).await?;
    let (_, flow) = type_line(&node, "/quit")?;
    assert_eq!(flow, Flow::Quit);
    Ok(())
}
