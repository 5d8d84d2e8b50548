use crate::infra::{load_catalog, InMemoryCatalogRepository, InMemoryTransactionRepository};
use cardwise::config::CatalogConfig;
use cardwise::error::AppError;
use cardwise::rewards::{
    CardDefinition, CardDraft, MatchKind, RankedResult, RecommendationRequest, RewardKind,
    RewardService, RuleDraft, TransactionDraft, TransactionFilter,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct RecommendArgs {
    /// Merchant the purchase is made at
    #[arg(long)]
    pub(crate) merchant: String,
    /// Spending category of the purchase
    #[arg(long)]
    pub(crate) category: String,
    /// Purchase amount
    #[arg(long)]
    pub(crate) amount: f64,
    /// Optional card catalog JSON to rank instead of the embedded one
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional card catalog JSON to seed instead of the embedded one
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Transaction date used in the walkthrough (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

type DemoService = RewardService<InMemoryCatalogRepository, InMemoryTransactionRepository>;

fn seeded_service(catalog_path: Option<PathBuf>) -> Result<(Arc<DemoService>, Vec<CardDefinition>), AppError> {
    let definitions = load_catalog(&CatalogConfig { path: catalog_path })?;
    let service = Arc::new(RewardService::new(
        Arc::new(InMemoryCatalogRepository::default()),
        Arc::new(InMemoryTransactionRepository::default()),
    ));
    service.seed_catalog(&definitions)?;
    Ok((service, definitions))
}

pub(crate) fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let RecommendArgs {
        merchant,
        category,
        amount,
        catalog,
    } = args;

    let (service, definitions) = seeded_service(catalog)?;
    let response = service.recommend(RecommendationRequest {
        merchant: merchant.clone(),
        category: category.clone(),
        amount,
        user_cards: None,
    })?;

    println!("Purchase: {amount:.2} at {merchant} ({category})");

    match &response.best_card {
        Some(best) => {
            println!("\nBest card: {} ({})", best.card.name, best.card.issuer);
            print_result(best);
            if let Some(definition) = definitions
                .iter()
                .find(|d| d.name == best.card.name && d.issuer == best.card.issuer)
            {
                if let Some(fee) = definition.annual_fee {
                    match &definition.annual_fee_waiver {
                        Some(waiver) => println!("  annual fee: {fee} ({waiver})"),
                        None => println!("  annual fee: {fee}"),
                    }
                }
                for benefit in &definition.benefits {
                    println!("  benefit: {benefit}");
                }
            }
        }
        None => println!("\nNo cards available to rank."),
    }

    if response.all_cards.len() > 1 {
        println!("\nFull ranking:");
        for (position, result) in response.all_cards.iter().enumerate() {
            println!("{}. {} ({})", position + 1, result.card.name, result.card.issuer);
            print_result(result);
        }
    }

    Ok(())
}

fn print_result(result: &RankedResult) {
    println!(
        "  {}% {} -> {:.2} ({:.2} in cash)",
        result.reward_rate,
        result.reward_kind.label(),
        result.reward_value,
        result.cash_value
    );
    if let Some(rule) = &result.rule {
        println!("  via {:?} rule for '{}'", rule.match_kind, rule.entity_name);
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { catalog, date } = args;
    let date = date.unwrap_or_else(|| Local::now().date_naive());

    println!("Cardwise walkthrough");
    let (service, _) = seeded_service(catalog)?;
    let seeded = service.list_cards()?;
    println!("Seeded {} predefined cards.", seeded.len());

    let card = service.add_card(CardDraft {
        name: "Personal Visa".to_string(),
        issuer: "Meridian Bank".to_string(),
        last4: Some("4242".to_string()),
        expiry: NaiveDate::from_ymd_opt(2029, 6, 30),
        card_type: "Visa".to_string(),
        default_reward_rate: 1.0,
        default_reward_kind: RewardKind::Cashback,
        default_point_value: None,
    })?;
    service.add_rule(
        &card.id,
        RuleDraft {
            match_kind: MatchKind::Category,
            match_value: "Dining".to_string(),
            reward_rate: 5.0,
            reward_kind: RewardKind::Cashback,
            point_value: None,
        },
    )?;
    println!(
        "Added {} with a 5% dining override.",
        card.name
    );

    let response = service.recommend(RecommendationRequest {
        merchant: "Local Bistro".to_string(),
        category: "Dining".to_string(),
        amount: 2000.0,
        user_cards: None,
    })?;
    println!("\nRanking a 2000.00 dining purchase:");
    for (position, result) in response.all_cards.iter().enumerate() {
        println!("{}. {} ({})", position + 1, result.card.name, result.card.issuer);
        print_result(result);
    }

    let Some(best) = response.best_card else {
        println!("\nNo cards available; skipping the transaction step.");
        return Ok(());
    };
    let transaction = service.record_transaction(TransactionDraft {
        date,
        merchant: "Local Bistro".to_string(),
        category: "Dining".to_string(),
        amount: 2000.0,
        card_id: best.card.id.clone(),
        note: Some("demo walkthrough".to_string()),
    })?;
    println!(
        "\nRecorded transaction {} on {}: earned {:.2}.",
        transaction.id.0, transaction.date, transaction.reward_earned
    );

    let summary = service.transaction_summary(&TransactionFilter::default())?;
    println!(
        "Totals: spent {:.2}, rewards {:.2}, average rate {:.2}%.",
        summary.total_spent, summary.total_rewards, summary.average_reward_rate
    );

    Ok(())
}
