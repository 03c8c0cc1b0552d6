//! Demo fixture dataset
//!
//! A small workforce snapshot used by the CLI when no real backends are
//! wired: eight employees across four departments, stored skill confidences,
//! and a handful of resume/review documents.

use crate::gateway::{InMemorySemanticGateway, InMemoryStructuredGateway};

/// Build the demo structured store
pub fn structured_store() -> InMemoryStructuredGateway {
    let mut gw = InMemoryStructuredGateway::new();

    gw.add_employee(1, "Alice Johnson", "Engineering", "Senior Software Engineer");
    gw.add_employee(2, "Bob Smith", "Data Science", "Machine Learning Engineer");
    gw.add_employee(3, "Carol Davis", "Engineering", "Full Stack Developer");
    gw.add_employee(4, "David Wilson", "Product", "Senior Product Manager");
    gw.add_employee(5, "Eva Martinez", "Design", "UX Designer");
    gw.add_employee(6, "Frank Chen", "Engineering", "DevOps Engineer");
    gw.add_employee(7, "Grace Taylor", "Data Science", "Data Analyst");
    gw.add_employee(8, "Isabella Rodriguez", "Engineering", "Backend Developer");

    gw.add_skill(1, "Python", "technical");
    gw.add_skill(2, "JavaScript", "technical");
    gw.add_skill(3, "Machine Learning", "technical");
    gw.add_skill(4, "Docker", "technical");
    gw.add_skill(5, "Kubernetes", "technical");
    gw.add_skill(6, "SQL", "technical");
    gw.add_skill(7, "API Design", "technical");
    gw.add_skill(8, "Leadership", "soft");
    gw.add_skill(9, "Communication", "soft");
    gw.add_skill(10, "Project Management", "soft");

    gw.add_proficiency(1, "Python", 95, "resume");
    gw.add_proficiency(1, "API Design", 90, "github");
    gw.add_proficiency(1, "Leadership", 88, "review");
    gw.add_proficiency(1, "Docker", 75, "resume");
    gw.add_proficiency(2, "Python", 85, "resume");
    gw.add_proficiency(2, "Machine Learning", 93, "github");
    gw.add_proficiency(2, "SQL", 70, "resume");
    gw.add_proficiency(3, "Python", 88, "resume");
    gw.add_proficiency(3, "API Design", 91, "github");
    gw.add_proficiency(3, "Leadership", 86, "review");
    gw.add_proficiency(3, "JavaScript", 82, "resume");
    gw.add_proficiency(4, "Project Management", 92, "review");
    gw.add_proficiency(4, "Communication", 89, "review");
    gw.add_proficiency(5, "Communication", 84, "review");
    gw.add_proficiency(6, "Docker", 94, "github");
    gw.add_proficiency(6, "Kubernetes", 90, "github");
    gw.add_proficiency(6, "Python", 65, "resume");
    gw.add_proficiency(7, "SQL", 87, "resume");
    gw.add_proficiency(7, "Python", 72, "resume");
    gw.add_proficiency(8, "Python", 78, "resume");
    gw.add_proficiency(8, "API Design", 74, "github");

    gw
}

/// Build the demo document store
pub fn semantic_store() -> InMemorySemanticGateway {
    let mut gw = InMemorySemanticGateway::new();

    gw.add_document(
        "alice_resume",
        Some(1),
        "Alice Johnson, Senior Software Engineer. Led the Project Phoenix platform \
         rebuild, owning the Python service layer and the public API design from \
         the first draft through launch. Previously drove the migration of three \
         legacy services to containerized deployments. Mentors two junior \
         engineers and runs the weekly architecture review.",
    );
    gw.add_document(
        "alice_review",
        Some(1),
        "Alice consistently demonstrates strong leadership under pressure. During \
         the Phoenix launch she coordinated four teams, unblocked the API rollout \
         twice, and kept stakeholders informed throughout. Promotion to staff \
         level recommended.",
    );
    gw.add_document(
        "bob_resume",
        Some(2),
        "Bob Smith, Machine Learning Engineer. Built the skills-extraction model \
         powering talent search, trained on internal review corpora. Deep Python \
         and SQL background; shipped three production model pipelines.",
    );
    gw.add_document(
        "carol_resume",
        Some(3),
        "Carol Davis, Full Stack Developer. Core contributor on Project Phoenix, \
         designing the REST API surface and the Python backend endpoints. Took \
         over team leadership for the final delivery phase and ran the launch \
         retrospective.",
    );
    gw.add_document(
        "david_review",
        Some(4),
        "David owns the quarterly roadmap and runs stakeholder alignment across \
         product and engineering. Communication is his standout strength; teams \
         describe his briefs as the clearest in the org.",
    );
    gw.add_document(
        "frank_resume",
        Some(6),
        "Frank Chen, DevOps Engineer. Runs the Kubernetes clusters and the \
         container build system. On-call lead for deployment infrastructure; \
         automated the release pipeline end to end with Docker.",
    );

    gw
}
