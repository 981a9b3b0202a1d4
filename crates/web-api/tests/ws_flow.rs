mod support;

use application::MessageRepository;
use chrono::Utc;
use domain::{ChatMessage, DisplayName, RoomName, UserId};
use serde_json::json;
use tokio_tungstenite::connect_async;

use support::{connect, expect_closed, recv_json, recv_until, send_json, spawn_app};

#[tokio::test]
async fn relay_and_presence_flow() {
    let app = spawn_app(None, None).await;

    let mut alice = connect(&app.ws_url()).await;
    let hello = recv_json(&mut alice).await;
    assert_eq!(hello["type"], "db_status");
    assert_eq!(hello["ok"], true);

    send_json(
        &mut alice,
        json!({"type":"join","user_id":"alice","name":"Alice","room":"lobby","age_ok":true}),
    )
    .await;
    let notice = recv_until(&mut alice, "system").await;
    assert_eq!(notice["text"], "Alice katıldı.");
    let presence = recv_until(&mut alice, "presence_full").await;
    assert_eq!(presence["members"].as_array().unwrap().len(), 1);

    let mut bob = connect(&app.ws_url()).await;
    recv_json(&mut bob).await; // db_status
    send_json(
        &mut bob,
        json!({"type":"join","user_id":"bob","name":"Bob","room":"lobby","age_ok":true}),
    )
    .await;

    // 先到者看到新人进场和更新后的名单
    let notice = recv_until(&mut alice, "system").await;
    assert_eq!(notice["text"], "Bob katıldı.");
    let presence = recv_until(&mut alice, "presence_full").await;
    assert_eq!(presence["members"].as_array().unwrap().len(), 2);

    // 聊天消息发给房间里的所有人，包括发送者自己
    send_json(&mut bob, json!({"type":"chat","text":"selam"})).await;
    let chat = recv_until(&mut alice, "chat").await;
    assert_eq!(chat["user_id"], "bob");
    assert_eq!(chat["text"], "selam");
    let chat = recv_until(&mut bob, "chat").await;
    assert_eq!(chat["text"], "selam");

    // 输入状态只转发给其他人
    send_json(&mut bob, json!({"type":"typing","is_typing":true})).await;
    let typing = recv_until(&mut alice, "typing").await;
    assert_eq!(typing["name"], "Bob");
    assert_eq!(typing["is_typing"], true);

    // 断开后广播离场通知，名单里转为离线
    bob.close(None).await.expect("close bob");
    let notice = recv_until(&mut alice, "system").await;
    assert_eq!(notice["text"], "Bob ayrıldı.");
    let presence = recv_until(&mut alice, "presence_full").await;
    let members = presence["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    let bob_row = members
        .iter()
        .find(|m| m["user_id"] == "bob")
        .expect("bob still listed");
    assert_eq!(bob_row["is_online"], false);

    let _ = app.shutdown_tx.send(());
}

#[tokio::test]
async fn access_key_is_checked_before_upgrade() {
    let app = spawn_app(Some("sesame"), None).await;

    let result = connect_async(app.ws_url()).await;
    assert!(result.is_err(), "upgrade without key should be refused");

    let result = connect_async(format!("{}?key=wrong", app.ws_url())).await;
    assert!(result.is_err(), "upgrade with wrong key should be refused");

    let mut ws = connect(&format!("{}?key=sesame", app.ws_url())).await;
    let hello = recv_json(&mut ws).await;
    assert_eq!(hello["type"], "db_status");

    let _ = app.shutdown_tx.send(());
}

#[tokio::test]
async fn abuse_escalates_to_kick_then_ban() {
    let app = spawn_app(None, None).await;

    let mut ws = connect(&app.ws_url()).await;
    recv_json(&mut ws).await; // db_status
    send_json(
        &mut ws,
        json!({"type":"join","user_id":"troll","name":"Troll","room":"lobby","age_ok":true}),
    )
    .await;

    // 第 1 次违规：警告，连接保持
    send_json(&mut ws, json!({"type":"chat","text":"salak"})).await;
    let blocked = recv_until(&mut ws, "blocked").await;
    assert_eq!(blocked["reason"], "message blocked (1/3)");

    // 第 2 次违规：踢出并断开
    send_json(&mut ws, json!({"type":"chat","text":"aptal"})).await;
    let blocked = recv_until(&mut ws, "blocked").await;
    assert_eq!(blocked["reason"], "kicked (2/3)");
    expect_closed(&mut ws).await;

    // 被踢后可以直接重连，第 3 次违规触发永久封禁
    let mut ws = connect(&app.ws_url()).await;
    recv_json(&mut ws).await;
    send_json(
        &mut ws,
        json!({"type":"join","user_id":"troll","name":"Troll","room":"lobby","age_ok":true}),
    )
    .await;
    send_json(&mut ws, json!({"type":"chat","text":"gerizekali"})).await;
    let blocked = recv_until(&mut ws, "blocked").await;
    assert_eq!(blocked["reason"], "banned");
    expect_closed(&mut ws).await;

    // IP 已封禁：新连接在握手后第一个事件就是拒绝
    let mut ws = connect(&app.ws_url()).await;
    let first = recv_json(&mut ws).await;
    assert_eq!(first["type"], "blocked");
    assert_eq!(first["reason"], "banned");
    expect_closed(&mut ws).await;

    let _ = app.shutdown_tx.send(());
}

#[tokio::test]
async fn history_is_sent_privately_on_join() {
    let app = spawn_app(None, Some(2)).await;

    let room = RoomName::sanitize("lobby");
    for i in 0..3 {
        app.stores
            .messages
            .append(ChatMessage::new(
                room.clone(),
                UserId::parse("eski").unwrap(),
                DisplayName::sanitize("Eski"),
                format!("mesaj {i}"),
                Utc::now(),
            ))
            .await
            .unwrap();
    }

    let mut ws = connect(&app.ws_url()).await;
    recv_json(&mut ws).await; // db_status
    send_json(
        &mut ws,
        json!({"type":"join","user_id":"yeni","name":"Yeni","room":"lobby","age_ok":true}),
    )
    .await;

    let history = recv_until(&mut ws, "history").await;
    let messages = history["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["text"], "mesaj 1");
    assert_eq!(messages[1]["text"], "mesaj 2");

    let _ = app.shutdown_tx.send(());
}

#[tokio::test]
async fn illegal_sale_message_is_never_relayed() {
    let app = spawn_app(None, None).await;

    let mut seller = connect(&app.ws_url()).await;
    recv_json(&mut seller).await;
    send_json(
        &mut seller,
        json!({"type":"join","user_id":"seller","name":"Satıcı","room":"lobby","age_ok":true}),
    )
    .await;

    let mut witness = connect(&app.ws_url()).await;
    recv_json(&mut witness).await;
    send_json(
        &mut witness,
        json!({"type":"join","user_id":"witness","name":"Tanık","room":"lobby","age_ok":true}),
    )
    .await;
    recv_until(&mut witness, "presence_full").await;

    send_json(
        &mut seller,
        json!({"type":"chat","text":"satilik esrar var"}),
    )
    .await;
    let blocked = recv_until(&mut seller, "blocked").await;
    assert_eq!(blocked["reason"], "banned");
    expect_closed(&mut seller).await;

    // 旁观者只看到离场通知，违规消息没有被转发
    loop {
        let event = recv_json(&mut witness).await;
        assert_ne!(event["type"], "chat", "moderated message must not be relayed");
        if event["type"] == "system" && event["text"] == "Satıcı ayrıldı." {
            break;
        }
    }

    let _ = app.shutdown_tx.send(());
}
