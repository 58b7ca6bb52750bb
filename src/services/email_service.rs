use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{MonthlyStats, User};

/// SMTP settings, read once at startup. With `enabled` false every send is
/// logged instead of delivered, which keeps local development quiet.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub app_url: String,
}

impl EmailConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("SMTP_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                == "true",
            host: std::env::var("SMTP_HOST").unwrap_or_default(),
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
            password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: std::env::var("SMTP_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@ledgerly.local".to_string()),
            from_name: std::env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Ledgerly".to_string()),
            app_url: std::env::var("APP_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        }
    }
}

pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub async fn send_budget_alert(
        &self,
        user: &User,
        account_name: &str,
        percentage_used: f64,
        budget_amount: &str,
        total_expenses: &str,
    ) -> Result<(), AppError> {
        let subject = format!("Budget Alert for {account_name}");
        let text = format!(
            "Hi {},\n\nYou have used {:.1}% of your monthly budget.\n\n\
             Budget: ${}\nSpent so far: ${}\nAccount: {}\n\n\
             Review your spending at {}",
            user.name, percentage_used, budget_amount, total_expenses, account_name,
            self.config.app_url
        );
        let html = build_budget_alert_html(
            &user.name,
            account_name,
            percentage_used,
            budget_amount,
            total_expenses,
            &self.config.app_url,
        );

        self.send(&user.email, &subject, text, html).await
    }

    pub async fn send_monthly_report(
        &self,
        user: &User,
        month: &str,
        stats: &MonthlyStats,
        insights: &[String],
    ) -> Result<(), AppError> {
        let subject = format!("Your Monthly Financial Report for {month}");
        let insight_lines = insights
            .iter()
            .map(|i| format!("- {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let text = format!(
            "Hi {},\n\nHere is your report for {}.\n\n\
             Total Income: ${}\nTotal Expenses: ${}\nNet: ${}\nTransactions: {}\n\n\
             Insights:\n{}\n\nSee the full breakdown at {}",
            user.name,
            month,
            stats.total_income,
            stats.total_expenses,
            stats.net(),
            stats.transaction_count,
            insight_lines,
            self.config.app_url
        );
        let html = build_monthly_report_html(&user.name, month, stats, insights, &self.config.app_url);

        self.send(&user.email, &subject, text, html).await
    }

    async fn send(
        &self,
        to: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            log_email(to, subject, &text_body);
            return Ok(());
        }

        let from_address = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| AppError::External(format!("Invalid from address: {e}")))?;
        let to_address = to
            .parse()
            .map_err(|e| AppError::External(format!("Invalid to address: {e}")))?;

        let email = Message::builder()
            .from(from_address)
            .to(to_address)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| AppError::External(format!("Failed to build email: {e}")))?;

        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
            .map_err(|e| AppError::External(format!("Failed to create SMTP transport: {e}")))?
            .port(self.config.port)
            .credentials(creds)
            .build();

        match mailer.send(email).await {
            Ok(_) => {
                info!("📧 Email sent to {} ({})", to, subject);
                Ok(())
            }
            Err(e) => {
                error!("❌ SMTP send to {} failed: {}", to, e);
                Err(AppError::External(format!("SMTP send failed: {e}")))
            }
        }
    }
}

/// Fallback when SMTP is disabled.
fn log_email(to: &str, subject: &str, body: &str) {
    info!("📧 Email would be sent:");
    info!("   To: {}", to);
    info!("   Subject: {}", subject);
    info!("   Body: {}", body);
}

fn build_budget_alert_html(
    user_name: &str,
    account_name: &str,
    percentage_used: f64,
    budget_amount: &str,
    total_expenses: &str,
    app_url: &str,
) -> String {
    format!(
        r#"
<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 0; padding: 0; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #ff9800; color: white; padding: 20px; border-radius: 5px 5px 0 0; }}
        .content {{ padding: 20px; background-color: #f9f9f9; border: 1px solid #ddd; border-top: none; }}
        .meter {{ background-color: #fff3e0; border-left: 4px solid #ff9800; padding: 12px; margin: 15px 0; border-radius: 4px; }}
        table {{ width: 100%; margin: 15px 0; }}
        td {{ padding: 8px; }}
        .label {{ font-weight: bold; }}
        .button {{ display: inline-block; background-color: #2196f3; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px; margin-top: 15px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Budget Alert</h1>
        </div>
        <div class="content">
            <p>Hi {user_name},</p>
            <div class="meter">
                You have used <strong>{percentage_used:.1}%</strong> of your monthly budget.
            </div>
            <table>
                <tr><td class="label">Account:</td><td>{account_name}</td></tr>
                <tr><td class="label">Budget:</td><td>${budget_amount}</td></tr>
                <tr><td class="label">Spent so far:</td><td>${total_expenses}</td></tr>
            </table>
            <a href="{app_url}" class="button">Review Spending</a>
        </div>
    </div>
</body>
</html>
"#
    )
}

fn build_monthly_report_html(
    user_name: &str,
    month: &str,
    stats: &MonthlyStats,
    insights: &[String],
    app_url: &str,
) -> String {
    let category_rows = stats
        .by_category
        .iter()
        .map(|(category, amount)| {
            format!("<tr><td>{category}</td><td>${amount}</td></tr>")
        })
        .collect::<Vec<_>>()
        .join("\n");

    let insight_items = insights
        .iter()
        .map(|insight| format!("<li>{insight}</li>"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"
<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 0; padding: 0; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #2196f3; color: white; padding: 20px; border-radius: 5px 5px 0 0; }}
        .content {{ padding: 20px; background-color: #f9f9f9; border: 1px solid #ddd; border-top: none; }}
        table {{ width: 100%; margin: 15px 0; border-collapse: collapse; }}
        td {{ padding: 8px; border-bottom: 1px solid #eee; }}
        .label {{ font-weight: bold; }}
        .footer {{ padding: 10px; text-align: center; color: #666; font-size: 12px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Your {month} Financial Report</h1>
        </div>
        <div class="content">
            <p>Hi {user_name},</p>
            <table>
                <tr><td class="label">Total Income:</td><td>${total_income}</td></tr>
                <tr><td class="label">Total Expenses:</td><td>${total_expenses}</td></tr>
                <tr><td class="label">Net:</td><td>${net}</td></tr>
                <tr><td class="label">Transactions:</td><td>{count}</td></tr>
            </table>
            <h3>Spending by Category</h3>
            <table>
                {category_rows}
            </table>
            <h3>Insights</h3>
            <ul>
                {insight_items}
            </ul>
        </div>
        <div class="footer">
            <p>View the full breakdown at <a href="{app_url}">{app_url}</a></p>
        </div>
    </div>
</body>
</html>
"#,
        total_income = stats.total_income,
        total_expenses = stats.total_expenses,
        net = stats.net(),
        count = stats.transaction_count,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    #[test]
    fn budget_alert_html_carries_figures() {
        let html = build_budget_alert_html("Ada", "Checking", 85.0, "1000", "850", "http://app");
        assert!(html.contains("85.0%"));
        assert!(html.contains("Checking"));
        assert!(html.contains("$1000"));
        assert!(html.contains("$850"));
    }

    #[test]
    fn monthly_report_html_lists_categories_and_insights() {
        let mut stats = MonthlyStats::default();
        stats.total_income = BigDecimal::from(1200);
        stats
            .by_category
            .insert("groceries".to_string(), BigDecimal::from(300));
        stats.transaction_count = 7;

        let insights = vec!["Spend less on snacks.".to_string()];
        let html = build_monthly_report_html("Ada", "April", &stats, &insights, "http://app");

        assert!(html.contains("April"));
        assert!(html.contains("groceries"));
        assert!(html.contains("$300"));
        assert!(html.contains("Spend less on snacks."));
    }
}
