//! Background delivery of queued email.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{EmailMessage, EmailProvider};

/// How a single delivery attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Failed,
    /// The send did not finish within the timeout and was abandoned.
    TimedOut,
}

/// Receives queued messages and delivers each on its own task.
///
/// Every send is wrapped in `tokio::time::timeout`; a send that exceeds
/// `send_timeout` is dropped. Outcomes are logged and counted in the
/// `emails_sent_total`, `emails_failed_total` and `emails_timed_out_total`
/// metrics. The loop ends when every sender has been dropped.
pub async fn run_mail_dispatcher(
    mut rx: mpsc::UnboundedReceiver<EmailMessage>,
    provider: Arc<dyn EmailProvider>,
    send_timeout: Duration,
) {
    info!("Mail dispatcher started");

    while let Some(message) = rx.recv().await {
        let provider = provider.clone();
        tokio::spawn(async move {
            deliver(provider.as_ref(), &message, send_timeout).await;
        });
    }

    info!("Mail dispatcher stopped");
}

/// Sends one message with a bounded wait.
pub async fn deliver(
    provider: &dyn EmailProvider,
    message: &EmailMessage,
    send_timeout: Duration,
) -> DeliveryOutcome {
    debug!(to = %message.to, subject = %message.subject, "Sending email");

    match tokio::time::timeout(send_timeout, provider.send(message)).await {
        Ok(Ok(())) => {
            metrics::counter!("emails_sent_total").increment(1);
            info!(to = %message.to, "Email sent");
            DeliveryOutcome::Sent
        }
        Ok(Err(e)) => {
            metrics::counter!("emails_failed_total").increment(1);
            warn!(to = %message.to, error = %e, "Sending email failed");
            DeliveryOutcome::Failed
        }
        Err(_) => {
            metrics::counter!("emails_timed_out_total").increment(1);
            warn!(to = %message.to, timeout_secs = send_timeout.as_secs(), "Sending email timed out");
            DeliveryOutcome::TimedOut
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mail::{EmailError, MockEmailProvider};
    use async_trait::async_trait;

    struct SlowProvider(Duration);

    #[async_trait]
    impl EmailProvider for SlowProvider {
        async fn send(&self, _message: &EmailMessage) -> Result<(), EmailError> {
            tokio::time::sleep(self.0).await;
            Ok(())
        }
    }

    fn message() -> EmailMessage {
        EmailMessage::verification("a@b.com", "123456")
    }

    #[tokio::test]
    async fn test_deliver_sent() {
        let mut provider = MockEmailProvider::new();
        provider
            .expect_send()
            .withf(|m| m.to == "a@b.com")
            .times(1)
            .returning(|_| Ok(()));

        let outcome = deliver(&provider, &message(), Duration::from_secs(30)).await;
        assert_eq!(outcome, DeliveryOutcome::Sent);
    }

    #[tokio::test]
    async fn test_deliver_failed() {
        let mut provider = MockEmailProvider::new();
        provider
            .expect_send()
            .returning(|_| Err(EmailError::SendFailed("connection refused".into())));

        let outcome = deliver(&provider, &message(), Duration::from_secs(30)).await;
        assert_eq!(outcome, DeliveryOutcome::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_times_out() {
        let provider = SlowProvider(Duration::from_secs(60));

        let outcome = deliver(&provider, &message(), Duration::from_secs(30)).await;
        assert_eq!(outcome, DeliveryOutcome::TimedOut);
    }

    #[tokio::test]
    async fn test_dispatcher_delivers_queued_messages() {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        let mut provider = MockEmailProvider::new();
        provider.expect_send().times(2).returning(move |m| {
            let _ = done_tx.send(m.to.clone());
            Ok(())
        });

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(EmailMessage::verification("a@b.com", "111111")).unwrap();
        tx.send(EmailMessage::verification("c@d.com", "222222")).unwrap();
        drop(tx);

        run_mail_dispatcher(rx, Arc::new(provider), Duration::from_secs(5)).await;

        let mut recipients = vec![done_rx.recv().await.unwrap(), done_rx.recv().await.unwrap()];
        recipients.sort();
        assert_eq!(recipients, vec!["a@b.com", "c@d.com"]);
    }
}
