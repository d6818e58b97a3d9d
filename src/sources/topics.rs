//! Generic technology topics for articles that are not grounded in news.

use rand::Rng;
use rand::seq::IndexedRandom;

/// Used when the settings file does not provide its own list.
pub const DEFAULT_TOPICS: &[&str] = &[
    "cybersecurity", "cloud computing", "blockchain", "artificial intelligence", "machine learning",
    "deep learning", "quantum computing", "edge computing", "devops", "gitops", "kubernetes", "docker",
    "serverless", "microservices", "API management", "zero trust", "network security", "data privacy",
    "GDPR compliance", "penetration testing", "ethical hacking", "firewall configuration", "VPN technology",
    "multi-factor authentication", "natural language processing", "computer vision", "generative AI",
    "neural networks", "digital twins", "augmented reality", "virtual reality", "mixed reality", "data science",
    "big data analytics", "data lakes", "data warehouses", "ETL pipelines", "real-time analytics", "BI tools",
    "fintech", "regtech", "healthtech", "edtech", "agritech", "legaltech", "low-code", "no-code platforms",
    "mobile development", "responsive design", "progressive web apps", "cross-platform apps",
    "web development", "frontend frameworks", "react.js", "vue.js", "angular", "backend systems", "REST APIs",
    "GraphQL", "WebSockets", "event-driven architecture", "CI/CD pipelines", "infrastructure as code",
    "cloud-native apps", "cloud security", "multi-cloud strategy", "hybrid cloud", "platform engineering",
    "digital transformation", "IT strategy", "tech stack optimization", "legacy system modernization",
    "distributed systems", "peer-to-peer networks", "open-source software", "SaaS", "PaaS", "IaaS",
    "edge AI", "AI governance", "digital ethics", "algorithmic bias", "privacy by design",
    "digital forensics", "incident response", "threat detection", "security operations center (SOC)",
    "log management", "SIEM tools", "compliance automation", "container security", "code quality",
    "static code analysis", "unit testing", "test-driven development", "agile methodology", "scrum",
    "product management", "user experience (UX)", "human-computer interaction", "accessibility",
    "tech leadership", "innovation management", "IT consulting", "technology trends", "smart cities",
    "connected devices", "IoT platforms", "wearable tech", "5G networks", "digital identity", "biometrics",
    "passwordless authentication", "data monetization", "tech regulation", "AI legislation", "sustainable IT",
    "green computing", "digital sovereignty", "robotics", "autonomous systems", "intelligent automation",
    "chatbots", "virtual assistants", "real-time collaboration tools",
];

/// Pick a topic uniformly at random.
///
/// An empty configured list falls back to [`DEFAULT_TOPICS`].
pub fn pick_topic<R: Rng + ?Sized>(topics: &[String], rng: &mut R) -> String {
    match topics.choose(rng) {
        Some(topic) => topic.clone(),
        None => DEFAULT_TOPICS
            .choose(rng)
            .map(|t| t.to_string())
            .unwrap_or_else(|| "technology trends".to_string()),
    }
}
