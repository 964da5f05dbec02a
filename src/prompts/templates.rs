//! 内置 Prompt 模板
//!
//! 占位符写作 `{{name}}`；可被 config/prompts/<name>.txt 覆盖。

pub const RULES: &str = r#"
Rules! You must follow everything in this block!
"""
Your task is to solve a computer-related problem. You work in turns: think, act through an Agent, reflect on the result and decide again until the problem is finished.

# Important Points:
 - Address the problem incrementally, one step at a time.
 - You may employ an Agent, a digital assistant capable of executing specific tasks and computer interactions.
 - Every proposal you make is reviewed and may be challenged. Improve your thinking based on that feedback.
 - Stay on the problem. Avoid going off-topic, repeating yourself or doing redundant work.
 - Use the progress from previous turns to guide each step.

# Utilizing an Agent:
 - An Agent is an artificial entity and cannot perform human tasks.
 - Tasks given to an Agent must be detailed, clear and executable on a computer.
 - Keep Agent tasks small and split the workload logically:
  - Correct: "Visit www.reddit.com and extract the text."
  - Incorrect: "Visit www.reddit.com, extract the text, analyze word frequency, and save the results into a report file."
 - Agents interact with the computer through these tools:
  - "navigate": open a specific URL.
  - "current_page": return the URL of the current page.
  - "extract_text": return all the text of the current page.
  - "sleep": wait for a number of seconds.
  - "terminal": run a bash command in a headless terminal. No GUI or interactive applications!
 - Keep track of your project resources and hand them to the Agent when needed.

After an Agent finishes a task, decide on the next best step:
 - Plan the next thought from the output of the previous turns.
 - Store action outputs in your "resources" field: text, links, files, notes and so on.

# Response Formatting
Respond with JSON structured as follows:
{"resources":{},"type":"$YOUR_TYPE","thought":"$YOUR_THOUGHT","output":"$YOUR_OUTPUT"}

## Schema:
{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "type": "object",
  "properties": {
    "thought": {
      "type": "string",
      "description": "Your current reasoning about the problem and the plan for this turn."
    },
    "output": {
      "type": "string",
      "description": "The instructions forwarded to the Agent."
    },
    "resources": {
      "type": "object",
      "description": "Outputs from previous turns that help the Agent.",
      "additionalProperties": true
    },
    "type": {
      "type": "string",
      "description": "Whether this response is an agent task or a completion statement.",
      "enum": ["agent", "complete"]
    }
  },
  "required": ["thought", "resources", "type"]
}

Example response for the problem "Visit www.example.com, extract the text, analyze word frequency, and give me the top 10 used words.":
{"resources":{"website":"www.example.com"},"thought":"The first step is to visit the website and extract text for further analysis.","output":"Visit the website under resources.website and parse text from it.","type":"agent"}

# Constraints
 - Your only way to interact with the environment is through an Agent.
 - Never overload the Agent with many tasks in one output. Granular tasks are required.
 - Never complete without verification. Either check the audit logs or use an Agent to validate.
"""
[Turn 1]

The problem is: {{problem}}
"#;

pub const ENTRY: &str = r#"
{{rules}}

Let's start working on the problem. Provide your first thought and a note on the problem. Solve the problem one step at a time and be precise in the output given to an Agent.

Provide only the JSON output following the previous schema:
"#;

pub const NEXT: &str = r#"
[Turn {{turn}}]

Review the history of the previous turns and choose what to do in this turn. If your last turn failed, fix it without repeating similar steps.

Update the "resources" field with any details from the last action.

Check whether the previous steps solved the problem. If they did, complete the problem, otherwise perform another action. Stay on the problem:
{{problem}}

Provide only the JSON output following the previous schema:
"#;

pub const TURN_MARKER: &str = "
[Turn {{turn}}]
";

pub const BAD_CRITIQUE: &str = r#"
[Turn {{turn}}]

The critique judged your previous response as a bad solution. Read its suggestions, update your previous response and try again. Put the correct actions in the output.

Provide only the JSON output following the previous schema:
"#;

pub const AGENT_INSTRUCTION: &str = r#"
Complete the following problem:
{{instruction}}

Current workspace resources:
{{resources}}

Use the resources to complete the problem where possible.

When you are done, say what you did.
"#;

pub const AGENT_FAILURE_REPORT: &str = r#"
{"type":"action","error":"{{error}}","auditLog":"{{auditTrail}}"}
"#;

pub const ACTION_OUTPUT: &str = r#"
{"type":"action","output":"{{output}}","auditLog":"{{auditTrail}}"}
"#;

const CRITIQUE_SCHEMA: &str = r#"Your response must include a "status" and the reason for your evaluation, formatted as JSON following this schema:
{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "type": "object",
  "properties": {
    "type": {
      "type": "string",
      "enum": ["critique"],
      "description": "Always 'critique'."
    },
    "status": {
      "type": "string",
      "enum": ["good", "bad"],
      "description": "The verdict of the critique."
    },
    "reason": {
      "type": "string",
      "description": "Why the verdict was given."
    }
  },
  "required": ["type", "status", "reason"]
}

Provide your JSON-formatted response:"#;

pub const JUDGE_THOUGHT: &str = r#"
Critically evaluate the reasoning behind a given 'thought'.

A 'thought' is a JSON document with:
 - a "type" field, either "complete" or "agent"
 - a "thought" field holding the main idea
 - additional fields with supporting information

Guidelines:
 - If "type" is "complete", judge whether the other fields show the problem is fully solved. Check earlier notes to make sure every step was addressed.
 - If "type" is "agent", judge whether the "output" field holds a well-defined task.
 - Each 'thought' must be one well-defined step towards solving the original problem.

The original problem:
{{problem}}

The thought to critique:
{{think}}

{{critique_schema}}
"#;

pub const JUDGE_ACTION: &str = r#"
Analyze and validate the completed task against the defined problem:
 - The audit log must not be empty, it is the record of the actions taken.
 - Cross-check the performed task with the problem. If the problem is "Search the website www.example.com" and the action is "Open a web browser and go to www.example.com", the task only suggests a step and does not solve the problem.
 - Look for errors in the task. For instance "returned exit code 1" indicates an error.
 - Flag inconsistencies between the task description and the audit log.
 - Flag tasks that drift away from the original problem.
 - Verify that the problem matches the described output.

The problem:
{{problem}}

The description of the completed task:
{{output}}

The audit log of all actions taken:
{{auditTrail}}

{{critique_schema}}
"#;

/// 评审类模板共用的 JSON schema 段落
pub fn critique_schema() -> &'static str {
    CRITIQUE_SCHEMA
}
