//! The graph itself (spec §4.7): node/edge registries, execution state, and
//! the `executeNode` algorithm that walks the graph one node at a time.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use skein_core::{GenerateTextRequest, NodeName, TextGenerator, ToolInvoker};
use skein_eventbus::EventBus;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::edge::{Edge, EdgePattern, GraphView, StopCondition};
use crate::error::AgentGraphError;
use crate::events::{NodeChunkEvent, NodeReasoningEvent, NodeStatusEvent, NODE_CHUNK, NODE_REASONING, NODE_STATUS};
use crate::node::{Node, NodeStatus, OutputMode};
use crate::state::ExecutionState;

/// Holds every node and edge of one graph plus the state of its most recent
/// walk. Mirrors `skein_workflow::WorkflowEngine`'s registry-plus-run split,
/// but a graph has no separate "run" handle — `execute_node` is re-entrant
/// over the same `ExecutionState` by design (loop/revision patterns revisit
/// nodes deliberately).
pub struct AgentGraph {
    nodes: RwLock<HashMap<NodeName, Node>>,
    edges: RwLock<Vec<Edge>>,
    state: RwLock<ExecutionState>,
    events: Arc<EventBus>,
    generator: Arc<dyn TextGenerator>,
    tools: Option<Arc<dyn ToolInvoker>>,
    signal: CancellationToken,
    model: String,
}

impl AgentGraph {
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        generator: Arc<dyn TextGenerator>,
        tools: Option<Arc<dyn ToolInvoker>>,
        signal: CancellationToken,
    ) -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            edges: RwLock::new(Vec::new()),
            state: RwLock::new(ExecutionState::new()),
            events: Arc::new(EventBus::new()),
            generator,
            tools,
            signal,
            model: model.into(),
        }
    }

    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    #[must_use]
    pub fn state_snapshot(&self) -> ExecutionState {
        self.state.read().clone()
    }

    pub fn add_node(&self, node: Node) {
        self.nodes.write().insert(node.name.clone(), node);
    }

    pub fn add_edge(&self, edge: Edge) {
        self.edges.write().push(edge);
    }

    #[must_use]
    pub fn get_node(&self, name: &NodeName) -> Option<Node> {
        self.nodes.read().get(name).cloned()
    }

    /// All edges terminating at `name` (spec §4.7).
    #[must_use]
    pub fn get_input_nodes(&self, name: &NodeName) -> Vec<NodeName> {
        self.edges.read().iter().filter(|edge| &edge.to == name).map(|edge| edge.from.clone()).collect()
    }

    fn outgoing_edges(&self, name: &NodeName) -> Vec<Edge> {
        self.edges.read().iter().filter(|edge| &edge.from == name).cloned().collect()
    }

    fn graph_view(&self, response: String) -> GraphView {
        GraphView {
            response,
            nodes: self.state.read().results_snapshot(),
        }
    }

    fn set_status(&self, node: &NodeName, status: NodeStatus) {
        self.state.write().set_status(node.clone(), status);
        self.events.emit(NODE_STATUS, NodeStatusEvent { node: node.clone(), status });
    }

    /// `shouldStop(stopCondition, currentResponse)` (spec §4.7).
    pub async fn should_stop(&self, stop_condition: &StopCondition, current_response: &str) -> bool {
        stop_condition.evaluate(current_response).await
    }

    /// Runs the destination node, falling back to `edge.config.fallback` on
    /// failure (spec §4.7 `withFallback`). `primary` and `fallback` are
    /// parameterized separately from the edge because the `loop` pattern
    /// invokes two distinct nodes (`to` then `from`) under the same edge's
    /// fallback policy.
    fn with_fallback<'a>(
        &'a self,
        primary: NodeName,
        fallback: Option<NodeName>,
        input: String,
        responses: &'a Mutex<Vec<String>>,
    ) -> BoxFuture<'a, Result<String, AgentGraphError>> {
        async move {
            match self.execute_node(primary.clone(), input.clone(), responses).await {
                Ok(result) => Ok(result),
                Err(err) => match fallback {
                    Some(fallback) => {
                        warn!(primary = %primary, fallback = %fallback, error = %err, "node failed; routing to fallback");
                        self.execute_node(fallback, input, responses).await
                    }
                    None => Err(err),
                },
            }
        }
        .boxed()
    }

    /// `processReasoningStep(node, input)` (spec §4.7): an auxiliary LLM
    /// call whose streamed trace goes out on the reasoning channel rather
    /// than the answer channel.
    async fn process_reasoning_step(&self, node: &Node, input: &str) -> Result<String, AgentGraphError> {
        let events = self.events.clone();
        let node_name = node.name.clone();
        let on_reasoning = Box::new(move |chunk: &str, full_text: &str| {
            events.emit(
                NODE_REASONING,
                NodeReasoningEvent {
                    node: node_name.clone(),
                    chunk: chunk.to_string(),
                    full_text: full_text.to_string(),
                },
            );
        });

        let prompt = format!("{}\n\nThink step by step, then respond with your reasoning:\n{}", node.system_prompt, input);
        let request = GenerateTextRequest::new(self.model.clone(), prompt, self.signal.clone()).with_on_reasoning(on_reasoning);

        self.generator
            .generate_text(request)
            .await
            .map_err(|source| AgentGraphError::Generation { node: node.name.clone(), source })
    }

    /// `processAgentMessage(nodeId, name, node, prompt, outputMode)` (spec
    /// §4.7): the main LLM call. Runs a bounded tool loop when the node has
    /// tools configured — a tool call is recognized by a `TOOL_CALL: name
    /// {args}` response prefix, and the tool's result is appended as a
    /// follow-up message for the next round.
    async fn process_agent_message(&self, node: &Node, prompt: &str, output_mode: OutputMode) -> Result<String, AgentGraphError> {
        let mut context = format!("{}\n\n{}", node.system_prompt, prompt);
        let max_steps = node.tool_steps.unwrap_or(0);

        for step in 0..=max_steps {
            let response = self.generate(node, &context, output_mode).await?;

            if step == max_steps || node.tools.is_none() {
                return Ok(response);
            }
            let Some(tools) = &self.tools else {
                return Ok(response);
            };
            let Some((tool_name, args)) = parse_tool_call(&response) else {
                return Ok(response);
            };

            let result = tools
                .invoke(&tool_name, args)
                .await
                .map_err(|source| AgentGraphError::Tool { node: node.name.clone(), source })?;
            context = format!("{context}\n\nTool `{tool_name}` returned: {result}");
        }
        unreachable!("loop always returns within max_steps + 1 iterations")
    }

    async fn generate(&self, node: &Node, prompt: &str, output_mode: OutputMode) -> Result<String, AgentGraphError> {
        let events = self.events.clone();
        let node_name = node.name.clone();
        let on_chunk = Box::new(move |chunk: &str, full_text: &str| {
            events.emit(
                NODE_CHUNK,
                NodeChunkEvent {
                    node: node_name.clone(),
                    chunk: chunk.to_string(),
                    full_text: full_text.to_string(),
                    output_mode,
                },
            );
        });

        let request = GenerateTextRequest::new(self.model.clone(), prompt, self.signal.clone()).with_on_chunk(on_chunk);

        self.generator
            .generate_text(request)
            .await
            .map_err(|source| AgentGraphError::Generation { node: node.name.clone(), source })
    }

    /// `executeNode(nodeName, input, responses)` (spec §4.7). Boxed: the
    /// edge-pattern handlers recurse back into this for destination nodes.
    pub fn execute_node<'a>(
        &'a self,
        name: NodeName,
        input: String,
        responses: &'a Mutex<Vec<String>>,
    ) -> BoxFuture<'a, Result<String, AgentGraphError>> {
        self.execute_node_inner(name, input, responses).boxed()
    }

    async fn execute_node_inner(&self, name: NodeName, input: String, responses: &Mutex<Vec<String>>) -> Result<String, AgentGraphError> {
        if self.signal.is_cancelled() {
            return Err(AgentGraphError::Cancelled);
        }

        let node = self.get_node(&name).ok_or_else(|| AgentGraphError::NodeNotFound(name.clone()))?;
        self.set_status(&name, NodeStatus::Pending);

        let result = self.run_node(&node, &input).await;
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.set_status(&name, NodeStatus::Failed);
                return Err(err);
            }
        };

        {
            let mut state = self.state.write();
            state.set_result(name.clone(), response.clone());
            state.mark_completed(name.clone());
        }
        responses.lock().push(response.clone());
        self.set_status(&name, NodeStatus::Completed);

        self.dispatch_edges(&name, &response, responses).await
    }

    async fn run_node(&self, node: &Node, input: &str) -> Result<String, AgentGraphError> {
        if node.enable_reasoning {
            self.set_status(&node.name, NodeStatus::Reasoning);
            self.process_reasoning_step(node, input).await?;
        }
        let output_mode = if node.is_step { OutputMode::Step } else { OutputMode::Answer };
        self.process_agent_message(node, input, output_mode).await
    }

    /// Traverses every outgoing edge of `name`, grouped by pattern and
    /// processed in the fixed order of the spec §4.8 table. Returns the
    /// response that propagates outward from this node.
    fn dispatch_edges<'a>(
        &'a self,
        name: &'a NodeName,
        source_response: &'a str,
        responses: &'a Mutex<Vec<String>>,
    ) -> BoxFuture<'a, Result<String, AgentGraphError>> {
        async move {
            let edges = self.outgoing_edges(name);
            if edges.is_empty() {
                return Ok(source_response.to_string());
            }

            const PATTERN_ORDER: [EdgePattern; 7] = [
                EdgePattern::Sequential,
                EdgePattern::Parallel,
                EdgePattern::Condition,
                EdgePattern::Map,
                EdgePattern::Reduce,
                EdgePattern::Loop,
                EdgePattern::Revision,
            ];

            let mut final_response = source_response.to_string();
            for pattern in PATTERN_ORDER {
                let group: Vec<Edge> = edges.iter().filter(|edge| edge.pattern == pattern).cloned().collect();
                if group.is_empty() {
                    continue;
                }
                final_response = match pattern {
                    EdgePattern::Sequential => self.run_sequential(group, source_response, responses).await?,
                    EdgePattern::Parallel => self.run_parallel(group, source_response, responses).await?,
                    EdgePattern::Condition => self.run_condition(group, source_response, responses).await?,
                    EdgePattern::Map => self.run_map(group, source_response, responses).await?,
                    EdgePattern::Reduce => self.run_reduce(group, responses).await?,
                    EdgePattern::Loop => self.run_loop(group, source_response, responses).await?,
                    EdgePattern::Revision => self.run_revision(group, source_response, responses).await?,
                };
            }
            Ok(final_response)
        }
        .boxed()
    }

    fn run_sequential<'a>(
        &'a self,
        mut edges: Vec<Edge>,
        source_response: &'a str,
        responses: &'a Mutex<Vec<String>>,
    ) -> BoxFuture<'a, Result<String, AgentGraphError>> {
        async move {
            edges.sort_by_key(|edge| edge.config.priority);
            for edge in &edges {
                self.with_fallback(edge.to.clone(), edge.config.fallback.clone(), source_response.to_string(), responses)
                    .await?;
            }
            Ok(source_response.to_string())
        }
        .boxed()
    }

    fn run_parallel<'a>(
        &'a self,
        edges: Vec<Edge>,
        source_response: &'a str,
        responses: &'a Mutex<Vec<String>>,
    ) -> BoxFuture<'a, Result<String, AgentGraphError>> {
        async move {
            let futures = edges
                .iter()
                .map(|edge| self.with_fallback(edge.to.clone(), edge.config.fallback.clone(), source_response.to_string(), responses));
            for result in join_all(futures).await {
                result?;
            }
            Ok(source_response.to_string())
        }
        .boxed()
    }

    fn run_condition<'a>(
        &'a self,
        edges: Vec<Edge>,
        source_response: &'a str,
        responses: &'a Mutex<Vec<String>>,
    ) -> BoxFuture<'a, Result<String, AgentGraphError>> {
        async move {
            let view = self.graph_view(source_response.to_string());
            for edge in &edges {
                let matches = edge.config.condition.as_ref().is_none_or(|condition| condition(&view));
                if matches {
                    self.with_fallback(edge.to.clone(), edge.config.fallback.clone(), source_response.to_string(), responses)
                        .await?;
                }
            }
            Ok(source_response.to_string())
        }
        .boxed()
    }

    fn run_map<'a>(
        &'a self,
        edges: Vec<Edge>,
        source_response: &'a str,
        responses: &'a Mutex<Vec<String>>,
    ) -> BoxFuture<'a, Result<String, AgentGraphError>> {
        async move {
            let mut final_output = source_response.to_string();
            for edge in &edges {
                let elements = edge
                    .config
                    .input_transform
                    .as_ref()
                    .map_or_else(|| vec![source_response.to_string()], |transform| transform(source_response));

                let futures = elements
                    .into_iter()
                    .map(|element| self.with_fallback(edge.to.clone(), edge.config.fallback.clone(), element, responses));
                let results: Vec<String> = join_all(futures).await.into_iter().collect::<Result<_, _>>()?;

                let combined = edge.config.output_transform.as_ref().map_or_else(|| results.join("\n"), |combine| combine(&results));
                self.state.write().set_result(edge.to.clone(), combined.clone());
                final_output = combined;
            }
            Ok(final_output)
        }
        .boxed()
    }

    fn run_reduce<'a>(&'a self, edges: Vec<Edge>, responses: &'a Mutex<Vec<String>>) -> BoxFuture<'a, Result<String, AgentGraphError>> {
        async move {
            let mut final_output = String::new();
            for edge in &edges {
                let predecessors = self.get_input_nodes(&edge.to);
                let inputs: Vec<String> = {
                    let state = self.state.read();
                    predecessors.iter().filter_map(|predecessor| state.result(predecessor).cloned()).collect()
                };
                let combined = edge.config.output_transform.as_ref().map_or_else(|| inputs.join("\n"), |combine| combine(&inputs));
                final_output = self
                    .with_fallback(edge.to.clone(), edge.config.fallback.clone(), combined, responses)
                    .await?;
            }
            Ok(final_output)
        }
        .boxed()
    }

    fn run_loop<'a>(
        &'a self,
        edges: Vec<Edge>,
        source_response: &'a str,
        responses: &'a Mutex<Vec<String>>,
    ) -> BoxFuture<'a, Result<String, AgentGraphError>> {
        async move {
            let mut final_output = source_response.to_string();
            for edge in &edges {
                let mut outputs = Vec::new();
                let mut current = source_response.to_string();

                for _ in 0..edge.config.max_iterations {
                    let to_output = self
                        .with_fallback(edge.to.clone(), edge.config.fallback.clone(), current, responses)
                        .await?;
                    outputs.push(to_output.clone());

                    let stop = match &edge.config.stop_condition {
                        Some(stop_condition) => self.should_stop(stop_condition, &to_output).await,
                        None => false,
                    };
                    if stop {
                        current = to_output;
                        break;
                    }
                    current = self
                        .with_fallback(edge.from.clone(), edge.config.fallback.clone(), to_output, responses)
                        .await?;
                }

                if outputs.is_empty() {
                    // maxIterations == 0: nothing ran, source response passes through unchanged.
                    final_output = current;
                } else {
                    let combined = edge.config.output_transform.as_ref().map_or_else(|| outputs.join("\n\n"), |combine| combine(&outputs));
                    self.set_status(&edge.from, NodeStatus::Completed);
                    self.set_status(&edge.to, NodeStatus::Completed);
                    final_output = combined;
                }
            }
            Ok(final_output)
        }
        .boxed()
    }

    fn run_revision<'a>(
        &'a self,
        edges: Vec<Edge>,
        source_response: &'a str,
        responses: &'a Mutex<Vec<String>>,
    ) -> BoxFuture<'a, Result<String, AgentGraphError>> {
        async move {
            let mut final_output = source_response.to_string();
            for edge in &edges {
                let mut current = source_response.to_string();
                for _ in 0..edge.config.max_iterations {
                    let prompt = match &edge.config.revision_prompt {
                        Some(build) => build(&self.graph_view(current.clone())),
                        None => current.clone(),
                    };
                    let output = self
                        .with_fallback(edge.to.clone(), edge.config.fallback.clone(), prompt, responses)
                        .await?;

                    let stop = match &edge.config.stop_condition {
                        Some(stop_condition) => self.should_stop(stop_condition, &output).await,
                        None => false,
                    };
                    current = output;
                    if stop {
                        break;
                    }
                }
                final_output = current;
            }
            Ok(final_output)
        }
        .boxed()
    }
}

fn parse_tool_call(response: &str) -> Option<(String, serde_json::Value)> {
    let rest = response.strip_prefix("TOOL_CALL:")?;
    let mut parts = rest.trim().splitn(2, ' ');
    let name = parts.next()?.trim().to_string();
    let args_str = parts.next().unwrap_or("{}").trim();
    let args = serde_json::from_str(args_str).ok()?;
    Some((name, args))
}
