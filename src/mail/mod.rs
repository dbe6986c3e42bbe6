pub mod smtp;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

pub use self::smtp::SmtpMailer;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("smtp transport: {0}")]
    Transport(String),
}

/// Outgoing HTML email
#[derive(Debug, Clone, PartialEq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl Mail {
    pub fn verification_code(to: &str, code: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "이메일 인증".to_string(),
            html: format!("<p> 이메일 인증번호는 {} 입니다. </p>", code),
        }
    }

    pub fn application_notice(to: &str, applicant_name: &str, applicant_id: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Boogie On & On 채용공고 지원 메일".to_string(),
            html: format!("귀하의 회사에 {}({})님이 지원하였습니다.", applicant_name, applicant_id),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> Result<(), MailError>;
}

/// Logs mails instead of delivering them; keeps a copy for inspection
#[derive(Default)]
pub struct LogMailer {
    sent: Mutex<Vec<Mail>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Mail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> Result<(), MailError> {
        info!("Mail to {} ({}) not delivered: SMTP is not configured", mail.to, mail.subject);
        self.sent.lock().await.push(mail);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_mailer_records_messages() {
        let mailer = LogMailer::new();
        mailer.send(Mail::verification_code("a@b.com", "AbCd1234")).await.unwrap();

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@b.com");
        assert!(sent[0].html.contains("AbCd1234"));
    }

    #[test]
    fn application_notice_names_applicant() {
        let mail = Mail::application_notice("hr@company.com", "김철수", "kim@school.ac.kr");
        assert!(mail.html.contains("김철수(kim@school.ac.kr)"));
    }
}
