//! Participant type inference
//!
//! Maps a participant name to a shape category using an ordered rule table.
//! Rules are evaluated top to bottom and the first match wins, so the table
//! order is significant: infrastructure names ending in `-er`/`-or` are
//! listed before the generic actor suffixes that would otherwise claim them.

use std::sync::OnceLock;

use regex::{RegexSet, RegexSetBuilder};

use super::database::ParticipantType;

/// Ordered `(pattern, type)` rules, matched case-insensitively
const RULES: &[(&str, ParticipantType)] = &[
    // Infrastructure names ending in -er/-or that must not fall through to the actor suffix rules
    (r"router$", ParticipantType::Networking),
    (r"balancer$", ParticipantType::Networking),
    (r"resolver$", ParticipantType::Networking),
    (r"limiter$", ParticipantType::Networking),
    (r"shaper$", ParticipantType::Networking),
    (r"scheduler$", ParticipantType::Service),
    (r"worker$", ParticipantType::Service),
    (r"handler$", ParticipantType::Service),
    (r"controller$", ParticipantType::Service),
    (r"manager$", ParticipantType::Service),
    (r"processor$", ParticipantType::Service),
    (r"dispatcher$", ParticipantType::Service),
    (r"listener$", ParticipantType::Service),
    (r"consumer$", ParticipantType::Service),
    (r"producer$", ParticipantType::Service),
    (r"subscriber$", ParticipantType::Service),
    (r"server$", ParticipantType::Service),
    (r"indexer$", ParticipantType::Service),
    (r"crawler$", ParticipantType::Service),
    (r"parser$", ParticipantType::Service),
    (r"logger$", ParticipantType::Service),
    (r"tracker$", ParticipantType::Service),
    (r"monitor$", ParticipantType::Service),
    (r"orchestrator$", ParticipantType::Service),
    (r"coordinator$", ParticipantType::Service),
    (r"validator$", ParticipantType::Service),
    (r"aggregator$", ParticipantType::Service),
    (r"collector$", ParticipantType::Service),
    (r"executor$", ParticipantType::Service),
    (r"authenticator$", ParticipantType::Service),
    (r"authorizer$", ParticipantType::Service),
    (r"emitter$", ParticipantType::Service),
    (r"adapter$", ParticipantType::Service),
    (r"compiler$", ParticipantType::Service),
    (r"transformer$", ParticipantType::Service),
    (r"loader$", ParticipantType::Service),
    (r"uploader$", ParticipantType::Service),
    (r"downloader$", ParticipantType::Service),
    (r"mailer$", ParticipantType::Service),
    (r"notifier$", ParticipantType::Service),
    (r"poller$", ParticipantType::Service),
    (r"runner$", ParticipantType::Service),
    (r"builder$", ParticipantType::Service),
    (r"exporter$", ParticipantType::Service),
    (r"importer$", ParticipantType::Service),
    (r"reconciler$", ParticipantType::Service),
    (r"generator$", ParticipantType::Service),
    (r"interceptor$", ParticipantType::Service),
    (r"detector$", ParticipantType::Service),
    (r"selector$", ParticipantType::Service),
    (r"container$", ParticipantType::Service),
    (r"cluster$", ParticipantType::Service),
    (r"docker$", ParticipantType::Service),
    (r"master$", ParticipantType::Service),
    (r"filter$", ParticipantType::Service),
    (r"timer$", ParticipantType::Service),
    (r"trigger$", ParticipantType::Service),
    (r"counter$", ParticipantType::Service),
    (r"helper$", ParticipantType::Service),
    (r"wrapper$", ParticipantType::Service),
    (r"mapper$", ParticipantType::Service),
    (r"layer$", ParticipantType::Service),
    (r"center$", ParticipantType::Service),
    (r"centre$", ParticipantType::Service),
    (r"order$", ParticipantType::Service),
    (r"broker$", ParticipantType::Queue),
    (r"publisher$", ParticipantType::Queue),
    (r"buffer$", ParticipantType::Queue),
    (r"ledger$", ParticipantType::Database),
    (r"folder$", ParticipantType::Database),
    (r"register$", ParticipantType::Database),
    (r"browser$", ParticipantType::Frontend),
    (r"renderer$", ParticipantType::Frontend),
    (r"^viewer$", ParticipantType::Frontend),
    (r"connector$", ParticipantType::External),
    (r"vendor$", ParticipantType::External),
    (r"provider$", ParticipantType::External),
    (r"^auth0$", ParticipantType::External),
    // Networking and gateways
    (r"^api$", ParticipantType::Gateway),
    (r"gateway$", ParticipantType::Gateway),
    (r"^gw$", ParticipantType::Gateway),
    (r"apigw", ParticipantType::Gateway),
    (r"^kong$", ParticipantType::Gateway),
    (r"apigee", ParticipantType::Gateway),
    (r"ingress", ParticipantType::Gateway),
    (r"proxy$", ParticipantType::Networking),
    (r"^(dns|cdn|vpn|nat|lb|elb|alb|nlb)$", ParticipantType::Networking),
    (r"cdn$", ParticipantType::Networking),
    (r"dns$", ParticipantType::Networking),
    (r"lb$", ParticipantType::Networking),
    (r"firewall$", ParticipantType::Networking),
    (r"waf$", ParticipantType::Networking),
    (r"egress", ParticipantType::Networking),
    (r"mesh$", ParticipantType::Networking),
    (r"envoy", ParticipantType::Networking),
    (r"nginx", ParticipantType::Networking),
    (r"haproxy", ParticipantType::Networking),
    (r"traefik", ParticipantType::Networking),
    (r"istio", ParticipantType::Networking),
    (r"cloudflare", ParticipantType::Networking),
    (r"akamai", ParticipantType::Networking),
    (r"fastly", ParticipantType::Networking),
    (r"edge$", ParticipantType::Networking),
    (r"network$", ParticipantType::Networking),
    (r"vpc$", ParticipantType::Networking),
    (r"switch$", ParticipantType::Networking),
    (r"tunnel$", ParticipantType::Networking),
    (r"route53", ParticipantType::Networking),
    // Databases and durable storage
    (r"db$", ParticipantType::Database),
    (r"^db", ParticipantType::Database),
    (r"database$", ParticipantType::Database),
    (r"postgres", ParticipantType::Database),
    (r"^pg$", ParticipantType::Database),
    (r"mysql", ParticipantType::Database),
    (r"mariadb", ParticipantType::Database),
    (r"mongo", ParticipantType::Database),
    (r"dynamo", ParticipantType::Database),
    (r"cassandra", ParticipantType::Database),
    (r"oracle", ParticipantType::Database),
    (r"sql$", ParticipantType::Database),
    (r"sqlite", ParticipantType::Database),
    (r"aurora", ParticipantType::Database),
    (r"spanner", ParticipantType::Database),
    (r"bigquery", ParticipantType::Database),
    (r"snowflake", ParticipantType::Database),
    (r"redshift", ParticipantType::Database),
    (r"cockroach", ParticipantType::Database),
    (r"couch", ParticipantType::Database),
    (r"neo4j", ParticipantType::Database),
    (r"firestore", ParticipantType::Database),
    (r"supabase", ParticipantType::Database),
    (r"store$", ParticipantType::Database),
    (r"storage$", ParticipantType::Database),
    (r"repo$", ParticipantType::Database),
    (r"repository$", ParticipantType::Database),
    (r"warehouse$", ParticipantType::Database),
    (r"lake$", ParticipantType::Database),
    (r"table$", ParticipantType::Database),
    (r"bucket$", ParticipantType::Database),
    (r"s3$", ParticipantType::Database),
    (r"^s3", ParticipantType::Database),
    (r"blob", ParticipantType::Database),
    (r"elastic", ParticipantType::Database),
    (r"opensearch", ParticipantType::Database),
    (r"solr", ParticipantType::Database),
    (r"clickhouse", ParticipantType::Database),
    (r"influx", ParticipantType::Database),
    (r"timescale", ParticipantType::Database),
    (r"archive$", ParticipantType::Database),
    (r"registry$", ParticipantType::Database),
    (r"catalog$", ParticipantType::Database),
    (r"records$", ParticipantType::Database),
    (r"index$", ParticipantType::Database),
    (r"vault$", ParticipantType::Database),
    // Caches
    (r"cache$", ParticipantType::Cache),
    (r"^cache", ParticipantType::Cache),
    (r"redis", ParticipantType::Cache),
    (r"memcache", ParticipantType::Cache),
    (r"valkey", ParticipantType::Cache),
    (r"hazelcast", ParticipantType::Cache),
    (r"varnish", ParticipantType::Cache),
    (r"keydb", ParticipantType::Cache),
    (r"dragonfly", ParticipantType::Cache),
    (r"ignite", ParticipantType::Cache),
    // Queues, streams and event buses
    (r"queue$", ParticipantType::Queue),
    (r"^queue", ParticipantType::Queue),
    (r"sqs", ParticipantType::Queue),
    (r"sns$", ParticipantType::Queue),
    (r"kafka", ParticipantType::Queue),
    (r"rabbit", ParticipantType::Queue),
    (r"mq$", ParticipantType::Queue),
    (r"activemq", ParticipantType::Queue),
    (r"nats", ParticipantType::Queue),
    (r"pulsar", ParticipantType::Queue),
    (r"kinesis", ParticipantType::Queue),
    (r"eventbus", ParticipantType::Queue),
    (r"bus$", ParticipantType::Queue),
    (r"topic$", ParticipantType::Queue),
    (r"stream$", ParticipantType::Queue),
    (r"pubsub", ParticipantType::Queue),
    (r"eventhub", ParticipantType::Queue),
    (r"eventgrid", ParticipantType::Queue),
    (r"channel$", ParticipantType::Queue),
    (r"inbox$", ParticipantType::Queue),
    (r"outbox$", ParticipantType::Queue),
    (r"mailbox$", ParticipantType::Queue),
    (r"pipeline$", ParticipantType::Queue),
    (r"celery", ParticipantType::Queue),
    (r"sidekiq", ParticipantType::Queue),
    (r"events$", ParticipantType::Queue),
    // Actors: well-known names first, then suffixes
    (r"^(user|users|customer|customers|client|admin|administrator)$", ParticipantType::Actor),
    (r"^(alice|bob|carol|charlie|dave|eve|mallory|trent|peggy|victor)$", ParticipantType::Actor),
    (r"^(operator|developer|dev|person|human|guest|visitor|member)$", ParticipantType::Actor),
    (r"^(buyer|seller|merchant|driver|rider|patient|doctor|nurse)$", ParticipantType::Actor),
    (r"^(student|teacher|employee|agent|reviewer|approver|owner|player)$", ParticipantType::Actor),
    (r"^(shopper|me|you|i|someone|actor|staff|support)$", ParticipantType::Actor),
    (r"user$", ParticipantType::Actor),
    (r"customer$", ParticipantType::Actor),
    (r"admin$", ParticipantType::Actor),
    (r"person$", ParticipantType::Actor),
    (r"actor$", ParticipantType::Actor),
    (r"owner$", ParticipantType::Actor),
    (r"team$", ParticipantType::Actor),
    (r"staff$", ParticipantType::Actor),
    (r"ist$", ParticipantType::Actor),
    (r"ant$", ParticipantType::Actor),
    (r"er$", ParticipantType::Actor),
    (r"or$", ParticipantType::Actor),
    // Frontends and client applications
    (r"^browser", ParticipantType::Frontend),
    (r"ui$", ParticipantType::Frontend),
    (r"^ui", ParticipantType::Frontend),
    (r"frontend$", ParticipantType::Frontend),
    (r"front-end", ParticipantType::Frontend),
    (r"web$", ParticipantType::Frontend),
    (r"webapp", ParticipantType::Frontend),
    (r"app$", ParticipantType::Frontend),
    (r"mobile", ParticipantType::Frontend),
    (r"ios$", ParticipantType::Frontend),
    (r"android", ParticipantType::Frontend),
    (r"spa$", ParticipantType::Frontend),
    (r"portal$", ParticipantType::Frontend),
    (r"dashboard$", ParticipantType::Frontend),
    (r"console$", ParticipantType::Frontend),
    (r"cli$", ParticipantType::Frontend),
    (r"client$", ParticipantType::Frontend),
    (r"page$", ParticipantType::Frontend),
    (r"view$", ParticipantType::Frontend),
    (r"screen$", ParticipantType::Frontend),
    (r"widget$", ParticipantType::Frontend),
    (r"react", ParticipantType::Frontend),
    (r"vue", ParticipantType::Frontend),
    (r"angular", ParticipantType::Frontend),
    (r"svelte", ParticipantType::Frontend),
    (r"electron", ParticipantType::Frontend),
    (r"desktop", ParticipantType::Frontend),
    (r"extension$", ParticipantType::Frontend),
    (r"terminal$", ParticipantType::Frontend),
    (r"kiosk$", ParticipantType::Frontend),
    // Internal services
    (r"service$", ParticipantType::Service),
    (r"services$", ParticipantType::Service),
    (r"svc$", ParticipantType::Service),
    (r"^svc", ParticipantType::Service),
    (r"api$", ParticipantType::Service),
    (r"backend$", ParticipantType::Service),
    (r"back-end", ParticipantType::Service),
    (r"microservice", ParticipantType::Service),
    (r"lambda", ParticipantType::Service),
    (r"functions?$", ParticipantType::Service),
    (r"jobs?$", ParticipantType::Service),
    (r"engine$", ParticipantType::Service),
    (r"core$", ParticipantType::Service),
    (r"auth$", ParticipantType::Service),
    (r"^auth", ParticipantType::Service),
    (r"iam$", ParticipantType::Service),
    (r"identity", ParticipantType::Service),
    (r"billing", ParticipantType::Service),
    (r"payments?$", ParticipantType::Service),
    (r"search$", ParticipantType::Service),
    (r"notifications?$", ParticipantType::Service),
    (r"daemon$", ParticipantType::Service),
    (r"cron$", ParticipantType::Service),
    (r"node$", ParticipantType::Service),
    (r"pod$", ParticipantType::Service),
    (r"host$", ParticipantType::Service),
    (r"instance$", ParticipantType::Service),
    (r"kubernetes", ParticipantType::Service),
    (r"k8s", ParticipantType::Service),
    (r"runtime$", ParticipantType::Service),
    (r"system$", ParticipantType::Service),
    (r"platform$", ParticipantType::Service),
    (r"module$", ParticipantType::Service),
    (r"component$", ParticipantType::Service),
    (r"logic$", ParticipantType::Service),
    (r"bot$", ParticipantType::Service),
    (r"ai$", ParticipantType::Service),
    (r"llm$", ParticipantType::Service),
    (r"model$", ParticipantType::Service),
    // Third-party and external systems
    (r"stripe", ParticipantType::External),
    (r"paypal", ParticipantType::External),
    (r"twilio", ParticipantType::External),
    (r"sendgrid", ParticipantType::External),
    (r"mailgun", ParticipantType::External),
    (r"okta", ParticipantType::External),
    (r"google", ParticipantType::External),
    (r"facebook", ParticipantType::External),
    (r"github", ParticipantType::External),
    (r"slack", ParticipantType::External),
    (r"salesforce", ParticipantType::External),
    (r"shopify", ParticipantType::External),
    (r"openai", ParticipantType::External),
    (r"plaid", ParticipantType::External),
    (r"adyen", ParticipantType::External),
    (r"braintree", ParticipantType::External),
    (r"segment", ParticipantType::External),
    (r"mixpanel", ParticipantType::External),
    (r"datadog", ParticipantType::External),
    (r"sentry", ParticipantType::External),
    (r"pagerduty", ParticipantType::External),
    (r"zendesk", ParticipantType::External),
    (r"hubspot", ParticipantType::External),
    (r"intercom", ParticipantType::External),
    (r"firebase", ParticipantType::External),
    (r"aws", ParticipantType::External),
    (r"azure", ParticipantType::External),
    (r"gcp", ParticipantType::External),
    (r"external", ParticipantType::External),
    (r"third-?party", ParticipantType::External),
    (r"3rd-?party", ParticipantType::External),
    (r"partner$", ParticipantType::External),
    (r"saas$", ParticipantType::External),
    (r"smtp", ParticipantType::External),
    (r"webhooks?$", ParticipantType::External),
    (r"bank$", ParticipantType::External),
    (r"oauth", ParticipantType::External),
    (r"idp$", ParticipantType::External),
    (r"sso$", ParticipantType::External),
    (r"apple", ParticipantType::External),
    (r"microsoft", ParticipantType::External),
    (r"dropbox", ParticipantType::External),
    (r"zoom", ParticipantType::External),
    (r"maps$", ParticipantType::External),
];

fn rule_set() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSetBuilder::new(RULES.iter().map(|(pattern, _)| *pattern))
            .case_insensitive(true)
            .build()
            .expect("participant inference rules are valid regexes")
    })
}

/// Infer a participant's type from its name
///
/// Pure and deterministic; names matching no rule are `Default`.
///
/// # Example
/// ```
/// use tideline::plugins::sequence::{infer_participant_type, ParticipantType};
///
/// assert_eq!(infer_participant_type("OrdersDB"), ParticipantType::Database);
/// assert_eq!(infer_participant_type("Router"), ParticipantType::Networking);
/// assert_eq!(infer_participant_type("Thing"), ParticipantType::Default);
/// ```
pub fn infer_participant_type(name: &str) -> ParticipantType {
    let name = name.trim();
    if name.is_empty() {
        return ParticipantType::Default;
    }

    // SetMatches iterates in ascending rule order
    rule_set()
        .matches(name)
        .iter()
        .next()
        .map(|index| RULES[index].1)
        .unwrap_or_default()
}

/// Number of rules in the inference table
pub fn rule_count() -> usize {
    RULES.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_suffix() {
        assert_eq!(infer_participant_type("DB"), ParticipantType::Database);
        assert_eq!(infer_participant_type("UserDB"), ParticipantType::Database);
        assert_eq!(infer_participant_type("EventStore"), ParticipantType::Database);
    }

    #[test]
    fn test_infrastructure_overrides_beat_actor_suffixes() {
        assert_eq!(infer_participant_type("Router"), ParticipantType::Networking);
        assert_eq!(infer_participant_type("Scheduler"), ParticipantType::Service);
        assert_eq!(infer_participant_type("JobProcessor"), ParticipantType::Service);
        assert_eq!(infer_participant_type("Browser"), ParticipantType::Frontend);
        assert_eq!(infer_participant_type("MessageBroker"), ParticipantType::Queue);
    }

    #[test]
    fn test_actor_names_and_suffixes() {
        assert_eq!(infer_participant_type("User"), ParticipantType::Actor);
        assert_eq!(infer_participant_type("alice"), ParticipantType::Actor);
        assert_eq!(infer_participant_type("Reviewer"), ParticipantType::Actor);
        assert_eq!(infer_participant_type("Customer"), ParticipantType::Actor);
    }

    #[test]
    fn test_gateway_and_networking() {
        assert_eq!(infer_participant_type("API"), ParticipantType::Gateway);
        assert_eq!(infer_participant_type("ApiGateway"), ParticipantType::Gateway);
        assert_eq!(infer_participant_type("CDN"), ParticipantType::Networking);
    }

    #[test]
    fn test_cache_queue_frontend_service_external() {
        assert_eq!(infer_participant_type("Redis"), ParticipantType::Cache);
        assert_eq!(infer_participant_type("OrderQueue"), ParticipantType::Queue);
        assert_eq!(infer_participant_type("Kafka"), ParticipantType::Queue);
        assert_eq!(infer_participant_type("WebApp"), ParticipantType::Frontend);
        assert_eq!(infer_participant_type("PaymentService"), ParticipantType::Service);
        assert_eq!(infer_participant_type("UserAPI"), ParticipantType::Service);
        assert_eq!(infer_participant_type("Stripe"), ParticipantType::External);
        assert_eq!(infer_participant_type("Auth0"), ParticipantType::External);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(infer_participant_type("orders_db"), ParticipantType::Database);
        assert_eq!(infer_participant_type("REDIS"), ParticipantType::Cache);
    }

    #[test]
    fn test_default_fallback() {
        assert_eq!(infer_participant_type("Thing"), ParticipantType::Default);
        assert_eq!(infer_participant_type(""), ParticipantType::Default);
    }

    #[test]
    fn test_deterministic() {
        for name in ["A", "Router", "DB", "Zed", "Checkout"] {
            assert_eq!(infer_participant_type(name), infer_participant_type(name));
        }
        assert!(rule_count() > 200);
    }
}
