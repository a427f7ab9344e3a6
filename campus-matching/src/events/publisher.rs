use uuid::Uuid;

use campus_shared::clients::rabbitmq::RabbitMQClient;
use campus_shared::types::event::{payloads, routing_keys, Event};

use crate::matching::pair::{LikeKind, Match};

const SOURCE: &str = "campus-matching";

pub async fn publish_like_sent(rabbitmq: &RabbitMQClient, from_user: Uuid, to_user: Uuid, kind: LikeKind) {
    let event = Event::new(
        SOURCE,
        routing_keys::MATCHING_LIKE_SENT,
        payloads::LikeSent {
            from_user,
            to_user,
            kind: kind.as_str().to_string(),
        },
    )
    .with_user(from_user);

    if let Err(e) = rabbitmq.publish(routing_keys::MATCHING_LIKE_SENT, &event).await {
        tracing::error!(error = %e, "failed to publish like.sent event");
    }
}

pub async fn publish_match_created(rabbitmq: &RabbitMQClient, m: &Match, chat_id: Uuid, initiator: Uuid) {
    let event = Event::new(
        SOURCE,
        routing_keys::MATCHING_MATCH_CREATED,
        payloads::MatchCreated {
            match_id: m.id,
            chat_id,
            user_low: m.user_low,
            user_high: m.user_high,
            compatibility_score: m.compatibility_score,
            is_dating_match: m.is_dating_match,
        },
    )
    .with_user(initiator);

    if let Err(e) = rabbitmq.publish(routing_keys::MATCHING_MATCH_CREATED, &event).await {
        tracing::error!(error = %e, match_id = %m.id, "failed to publish match.created event");
    }
}

pub async fn publish_match_removed(rabbitmq: &RabbitMQClient, match_id: Uuid, removed_by: Uuid) {
    let event = Event::new(
        SOURCE,
        routing_keys::MATCHING_MATCH_REMOVED,
        payloads::MatchRemoved { match_id, removed_by },
    )
    .with_user(removed_by);

    if let Err(e) = rabbitmq.publish(routing_keys::MATCHING_MATCH_REMOVED, &event).await {
        tracing::error!(error = %e, "failed to publish match.removed event");
    }
}

pub async fn publish_request_joined(
    rabbitmq: &RabbitMQClient,
    request_id: Uuid,
    owner_id: Uuid,
    member_id: Uuid,
    match_id: Option<Uuid>,
) {
    let event = Event::new(
        SOURCE,
        routing_keys::MATCHING_REQUEST_JOINED,
        payloads::RequestJoined {
            request_id,
            owner_id,
            member_id,
            match_id,
        },
    )
    .with_user(member_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MATCHING_REQUEST_JOINED, &event).await {
        tracing::error!(error = %e, "failed to publish request.joined event");
    }
}
