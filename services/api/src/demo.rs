use crate::infra::{ConfiguredProcessor, Marketplace, SimulatedProcessor};
use chrono::Utc;
use clap::Args;
use rentgate::config::{
    AppConfig, AppEnvironment, AuthConfig, PaymentsConfig, ServerConfig, TelemetryConfig,
    UploadConfig,
};
use rentgate::error::AppError;
use rentgate::workflows::accounts::{RegistrationRequest, Role, User, UserId, UserRepository};
use rentgate::workflows::listings::{BrowseParams, PropertySubmission};
use rentgate::workflows::subscriptions::{
    intent_id_from_client_secret, ConfirmPaymentRequest, PricingTable, SubscriptionType,
};
use rentgate::workflows::uploads::{IncomingFile, UploadCategory};
use serde_json::json;
use std::fmt::Display;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct PricingArgs {
    /// Print the price list as JSON instead of a table.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Directory for files uploaded during the demo. Defaults to a fresh
    /// directory under the system temp dir.
    #[arg(long)]
    pub(crate) upload_dir: Option<PathBuf>,
}

pub(crate) fn run_pricing(args: PricingArgs) -> Result<(), AppError> {
    let pricing = PricingTable::current();

    if args.json {
        let rendered = serde_json::to_string_pretty(&pricing)
            .map_err(|err| AppError::Workflow(err.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    let first_time = [
        (Role::Student, pricing.first_time.student),
        (Role::GovernmentWorker, pricing.first_time.government_worker),
        (Role::Family, pricing.first_time.family),
        (Role::Landlord, pricing.first_time.landlord),
    ];
    println!("First-time subscription");
    for (role, price) in first_time {
        println!("  {:<18} {:>6.2}", role.to_string(), price);
    }
    println!("Monthly renewal");
    println!("  {:<18} {:>6.2}", "any role", pricing.monthly_renewal);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let upload_dir = args.upload_dir.unwrap_or_else(|| {
        std::env::temp_dir().join(format!("rentgate-demo-{}", uuid::Uuid::new_v4()))
    });
    let config = demo_config(upload_dir);
    let marketplace = Marketplace::in_memory(
        &config,
        ConfiguredProcessor::Simulated(SimulatedProcessor::default()),
    );
    marketplace.uploads.store().ensure_layout().await?;

    println!("Rental marketplace demo");
    println!("Uploads land in {}", config.uploads.root_dir.display());

    let landlord = register(&marketplace, "Lena Landlord", "lena@example.com", "landlord")?;
    let renter = register(&marketplace, "Sam Student", "sam@example.com", "student")?;

    println!("\nSubscriptions");
    let landlord = subscribe(&marketplace, &landlord).await?;
    let renter = subscribe(&marketplace, &renter).await?;

    let submission: PropertySubmission = serde_json::from_value(json!({
        "title": "Sunny studio near campus",
        "description": "Bright studio with a kitchenette, five minutes from the library.",
        "houseNumber": "12B",
        "address": {
            "street": "College Avenue",
            "city": "Ithaca",
            "region": "NY",
            "postalCode": "14850"
        },
        "location": { "coordinates": [-76.4966, 42.4440] },
        "rentPrice": 950,
        "propertyType": "studio",
        "bedrooms": 1,
        "bathrooms": 1,
        "amenities": ["wifi", "laundry"]
    }))
    .map_err(failure)?;
    let listing = marketplace
        .listings
        .create(&landlord, submission, Utc::now())
        .map_err(failure)?;
    println!("\nListing created");
    println!("  {} ({})", listing.details.title, listing.id);
    println!(
        "  rent {:.2}, {} bedroom(s), {}",
        listing.details.rent_price,
        listing.details.bedrooms,
        listing.details.property_type.label()
    );

    let browse = BrowseParams {
        lat: Some("42.44".to_string()),
        lng: Some("-76.5".to_string()),
        radius: Some("5".to_string()),
        ..BrowseParams::default()
    };
    let nearby = marketplace.listings.browse(browse).map_err(failure)?;
    println!("\nRenter search within 5 km: {} listing(s)", nearby.len());
    for view in &nearby {
        let owner = view
            .owner
            .as_ref()
            .map(|contact| contact.name.as_str())
            .unwrap_or("unknown owner");
        println!("  {} listed by {}", view.details.title, owner);
    }

    let category = UploadCategory::IdDocument;
    let document = marketplace
        .uploads
        .store()
        .stage_bytes(
            category,
            IncomingFile::new(category.field_name(), "student-id.pdf", "application/pdf"),
            b"%PDF-1.4 demo identity document",
        )
        .await
        .map_err(failure)?;
    let uploaded = marketplace
        .uploads
        .upload_id_document(&renter, vec![document])
        .await
        .map_err(failure)?;
    println!("\nID document stored at {}", uploaded.document_url);

    let renter = reload(&marketplace, &renter.id)?;
    marketplace
        .listings
        .express_interest(&renter, &listing.id, Utc::now())
        .map_err(failure)?;
    println!("{} expressed interest in {}", renter.name, listing.details.title);

    println!("\nLandlord dashboard");
    for owned in marketplace
        .listings
        .owned_listings(&landlord)
        .map_err(failure)?
    {
        println!(
            "  {}: {} interested",
            owned.details.title,
            owned.interested_users.len()
        );
        for interest in &owned.interested_users {
            println!(
                "    {} <{}> applied {}",
                interest.user.name,
                interest.user.email,
                interest.applied_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}

fn demo_config(upload_dir: PathBuf) -> AppConfig {
    AppConfig {
        environment: AppEnvironment::Development,
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        telemetry: TelemetryConfig {
            log_level: "warn".to_string(),
        },
        auth: AuthConfig {
            token_secret: format!("demo-{}", uuid::Uuid::new_v4()),
            token_ttl_hours: 1,
        },
        payments: PaymentsConfig {
            stripe_secret_key: None,
            api_base: String::new(),
            currency: "usd".to_string(),
        },
        uploads: UploadConfig {
            root_dir: upload_dir,
            max_file_bytes: 5 * 1024 * 1024,
        },
    }
}

fn register(
    marketplace: &Marketplace,
    name: &str,
    email: &str,
    role: &str,
) -> Result<User, AppError> {
    let session = marketplace
        .accounts
        .register(
            RegistrationRequest {
                name: Some(name.to_string()),
                email: Some(email.to_string()),
                password: Some("demo-password".to_string()),
                role: Some(role.to_string()),
                phone: Some("555-0100".to_string()),
            },
            Utc::now(),
        )
        .map_err(failure)?;
    println!("Registered {} as {}", session.user.name, session.user.role);
    reload(marketplace, &session.user.id)
}

async fn subscribe(marketplace: &Marketplace, user: &User) -> Result<User, AppError> {
    let intent = marketplace
        .subscriptions
        .create_payment_intent(user, Some(SubscriptionType::FirstTime.label()))
        .await
        .map_err(failure)?;
    let intent_id = intent_id_from_client_secret(&intent.client_secret)
        .ok_or_else(|| AppError::Workflow("client secret does not name an intent".to_string()))?
        .to_string();

    let activation = marketplace
        .subscriptions
        .confirm_payment(
            user,
            ConfirmPaymentRequest {
                payment_intent_id: intent_id,
                subscription_type: None,
            },
            Utc::now(),
        )
        .await
        .map_err(failure)?;
    println!(
        "  {} paid {:.2}, active until {}",
        user.name,
        intent.amount,
        activation.subscription_expiry_date.format("%Y-%m-%d")
    );
    reload(marketplace, &user.id)
}

fn reload(marketplace: &Marketplace, id: &UserId) -> Result<User, AppError> {
    marketplace
        .users
        .fetch(id)
        .map_err(failure)?
        .ok_or_else(|| AppError::Workflow(format!("user {id} vanished")))
}

fn failure(err: impl Display) -> AppError {
    AppError::Workflow(err.to_string())
}
