use axum::response::Json;
use serde::Serialize;

/// Agenda template sets for the recurring 1-on-1 formats used with
/// client-site consultants.
#[derive(Debug, Serialize)]
pub struct AgendaTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub agendas: Vec<AgendaTemplateItem>,
}

#[derive(Debug, Serialize)]
pub struct AgendaTemplateItem {
    pub title: &'static str,
    pub description: &'static str,
}

fn item(title: &'static str, description: &'static str) -> AgendaTemplateItem {
    AgendaTemplateItem { title, description }
}

pub fn agenda_templates() -> Vec<AgendaTemplate> {
    vec![
        AgendaTemplate {
            name: "Monthly check-in",
            description: "Standing agenda for the regular monthly 1-on-1",
            agendas: vec![
                item(
                    "Review of last meeting's next actions",
                    "Progress on the actions agreed last time",
                ),
                item(
                    "This month's work",
                    "Project progress, blockers and wins on the current assignment",
                ),
                item(
                    "Goal progress",
                    "Where the agreed goals (OKRs) stand and what is in the way",
                ),
                item(
                    "Skills and career",
                    "Technologies to learn, certifications to pursue, career direction",
                ),
                item(
                    "Client-site concerns",
                    "Issues at the client site: workload, relationships, environment",
                ),
                item(
                    "Requests to the company",
                    "Suggestions for processes, support or working conditions",
                ),
                item(
                    "Next month's focus",
                    "What to concentrate on until the next check-in",
                ),
            ],
        },
        AgendaTemplate {
            name: "Project onboarding",
            description: "Early follow-up after joining a new client project",
            agendas: vec![
                item(
                    "Project overview",
                    "Understanding of the assignment, tech stack and team setup",
                ),
                item(
                    "Settling in at the client",
                    "Client culture, ways of working, communication style",
                ),
                item(
                    "Technical worries",
                    "New technologies, tools or processes causing friction",
                ),
                item(
                    "Ramp-up plan",
                    "Learning plan for the skills the assignment needs",
                ),
                item(
                    "Support network",
                    "Who to ask questions, escalation paths",
                ),
                item(
                    "Short-term goals",
                    "What to achieve within the first one to three months",
                ),
            ],
        },
        AgendaTemplate {
            name: "Quarterly review",
            description: "Quarterly retrospective and planning",
            agendas: vec![
                item(
                    "Quarter retrospective",
                    "Achievements, struggles and lessons from the quarter",
                ),
                item(
                    "Goal attainment",
                    "How the quarter's goals landed and why",
                ),
                item(
                    "Growth check",
                    "Skills gained, growth felt, feedback received",
                ),
                item(
                    "Next quarter's goals",
                    "What to take on and learn next quarter",
                ),
                item(
                    "Career plan review",
                    "Adjusting the mid-term career direction",
                ),
            ],
        },
        AgendaTemplate {
            name: "Problem solving",
            description: "Deep-dive on a specific problem or improvement idea",
            agendas: vec![
                item("Frame the problem", "Lay out the issue in concrete terms"),
                item("Root causes", "Dig into what is actually driving it"),
                item("Options", "Sketch candidate improvements"),
                item("Action plan", "Concrete steps to carry the chosen option out"),
                item("How we measure", "How to tell whether the change worked"),
            ],
        },
    ]
}

/// GET /api/one-on-ones/templates
pub async fn list_templates() -> Json<Vec<AgendaTemplate>> {
    Json(agenda_templates())
}
