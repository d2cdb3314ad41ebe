use uuid::Uuid;

use super::{button_form, escape, escape_opt, hidden, options};
use crate::datetime::display;
use crate::models::{MessageListing, Profile};

fn row(viewer: &Uuid, listing: &MessageListing) -> String {
    let msg = &listing.message;
    let incoming = msg.recipient_id == *viewer;
    let (direction, party) = if incoming {
        ("De", listing.sender_name.as_deref())
    } else {
        ("À", listing.recipient_name.as_deref())
    };
    let action = if incoming && msg.read_at.is_none() {
        button_form(
            "/actions/messages/read",
            &hidden("message_id", &msg.id),
            "Marquer comme lu",
            "secondary",
        )
    } else {
        String::new()
    };
    let unread = if incoming && msg.read_at.is_none() { " <b>•</b>" } else { "" };
    format!(
        r#"<tr><td>{when}{unread}</td><td>{direction} {party}</td><td>{body}</td><td>{action}</td></tr>"#,
        when = display(&msg.created_at),
        party = escape_opt(party),
        body = escape(&msg.body),
    )
}

/// Inbox with sent and received messages, newest first.
pub fn page(viewer: &Uuid, inbox: &[MessageListing], recipients: &[Profile]) -> String {
    let rows: String = inbox.iter().map(|m| row(viewer, m)).collect();
    let recipient_options = options(
        recipients.iter().map(|p| {
            (
                p.id.to_string(),
                format!("{} ({})", p.display_name(), p.role.label()),
            )
        }),
        None,
    );
    format!(
        r#"<h1>Messages</h1>
<form method="post" action="/actions/messages" class="card">
<label>Destinataire<select name="recipientId" required><option value="">—</option>{recipient_options}</select></label>
<label>Message<textarea name="body" rows="3" required maxlength="4000"></textarea></label>
<button type="submit">Envoyer</button>
</form>
<table><thead><tr><th>Date</th><th>Correspondant</th><th>Message</th><th></th></tr></thead><tbody>{rows}</tbody></table>"#
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::Message;

    #[test]
    fn unread_incoming_message_can_be_marked() {
        let me = Uuid::new_v4();
        let listing = MessageListing {
            message: Message {
                id: Uuid::new_v4(),
                sender_id: Uuid::new_v4(),
                recipient_id: me,
                body: "<i>Bonjour</i>".into(),
                created_at: Utc::now(),
                read_at: None,
            },
            sender_name: Some("Bernard Myriel".into()),
            recipient_name: None,
        };
        let html = page(&me, std::slice::from_ref(&listing), &[]);
        assert!(html.contains("/actions/messages/read"));
        assert!(html.contains("De Bernard Myriel"));
        assert!(html.contains("&lt;i&gt;Bonjour"));

        let sender = listing.message.sender_id;
        let sent = page(&sender, &[listing], &[]);
        assert!(!sent.contains("/actions/messages/read"));
    }
}
