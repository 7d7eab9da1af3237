//! Integration tests for deployment orchestration.
//!
//! These tests run whole topologies against the mock engine and check what
//! was declared, in which order, and with which arguments.

use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use topo_config::{ConfigStore, TopologyConfig};
use topo_core::{CoreError, Deployment, ReferenceKind, StepAction};
use topo_engine::{
    EngineError, EngineResult, MockEngine, ResourceArgs, ResourceEngine, ResourceHandle,
    ResourceKind,
};

const RESOURCE_GROUP: &str = r#"{"name": "rg1", "location": "uswest"}"#;

fn topology(pairs: &[(&str, &str)]) -> TopologyConfig {
    let mut store = ConfigStore::from_pairs([("topo:resourceGroup", RESOURCE_GROUP)]);
    for (key, value) in pairs {
        store.insert(format!("topo:{}", key), *value);
    }
    TopologyConfig::load(&store.namespace("topo")).unwrap()
}

fn network_pairs() -> Vec<(&'static str, &'static str)> {
    vec![
        ("appSecurityGroups", r#"[{"name": "web-servers"}]"#),
        (
            "networkSecurityRules",
            r#"[{
                "access": "Allow",
                "description": "allow HTTP and HTTPS",
                "destinationAppSecurityGroups": ["web-servers"],
                "destinationPortRanges": ["80", "443"],
                "direction": "Inbound",
                "name": "allow-web",
                "priority": 100,
                "protocol": "Tcp",
                "sourceAddressPrefix": "AzureLoadBalancer",
                "sourcePortRange": "*"
            }]"#,
        ),
        (
            "networkSecurityGroups",
            r#"[{"name": "default", "securityRules": ["allow-web"]}]"#,
        ),
        (
            "subnets",
            r#"[{"name": "subnet-00", "addressPrefix": "10.0.10.0/24", "securityGroup": "default"}]"#,
        ),
        (
            "virtualNetworks",
            r#"[{"name": "vnet1", "cidr": "10.0.0.0/16", "subnets": ["subnet-00"]}]"#,
        ),
    ]
}

fn compute_pairs(vm: &str) -> Vec<(&'static str, &str)> {
    vec![
        (
            "osProfiles",
            r#"[{"name": "default", "adminUsername": "azure", "customData": "apt install -y ntpd"}]"#,
        ),
        (
            "osProfilesLinux",
            r#"[{"Name": "default", "DisablePasswordAuthentication": false}]"#,
        ),
        (
            "storageImageReference",
            r#"[{"name": "ubuntu-16.04", "offer": "UbuntuServer", "publisher": "Canonical", "sku": "16.04-LTS", "version": "latest"}]"#,
        ),
        (
            "storageOSDisk",
            r#"[{"name": "default", "createOption": "FromImage", "diskSizeGB": 30, "osType": "Linux"}]"#,
        ),
        ("virtualMachines", vm),
    ]
}

const WEB_VMS: &str = r#"[{
    "name": "web",
    "count": 3,
    "appSecGroup": "web-servers",
    "osProfile": "default",
    "osProfileLinux": "default",
    "storageImageReference": "ubuntu-16.04",
    "storageOSDisk": "default",
    "virtualNetwork": "vnet1",
    "subnet": "subnet-00",
    "vmSize": "Standard_B1ls"
}]"#;

fn steps(report: &topo_core::DeploymentReport) -> Vec<(StepAction, String, String)> {
    report
        .steps
        .iter()
        .map(|s| (s.action, s.kind.clone(), s.name.clone()))
        .collect()
}

fn step(action: StepAction, kind: &str, name: &str) -> (StepAction, String, String) {
    (action, kind.to_string(), name.to_string())
}

/// rg1 -> web-servers -> allow-web -> default -> subnet-00 -> vnet1.
#[tokio::test]
async fn test_network_scenario_declares_in_dependency_order() {
    let engine = MockEngine::new("topo", "dev");
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let report = deployment.run(&topology(&network_pairs())).await.unwrap();

    assert_eq!(
        steps(&report),
        vec![
            step(StepAction::Declared, "resource group", "rg1"),
            step(StepAction::Declared, "application security group", "web-servers"),
            step(StepAction::Bound, "network security rule", "allow-web"),
            step(StepAction::Declared, "network security group", "default"),
            step(StepAction::Bound, "subnet", "subnet-00"),
            step(StepAction::Declared, "virtual network", "vnet1"),
        ]
    );

    assert_eq!(
        engine.declared(),
        vec![
            (ResourceKind::ResourceGroup, "rg1".to_string()),
            (ResourceKind::ApplicationSecurityGroup, "web-servers".to_string()),
            (ResourceKind::NetworkSecurityGroup, "default".to_string()),
            (ResourceKind::VirtualNetwork, "vnet1".to_string()),
        ]
    );

    // The rule is bound to the application security group handle.
    let nsg = engine
        .find(ResourceKind::NetworkSecurityGroup, "default")
        .unwrap();
    let nsg_args = nsg.args.resolve().await.unwrap();
    assert_eq!(nsg_args["securityRules"].as_array().unwrap().len(), 1);
    assert_eq!(nsg_args["securityRules"][0]["name"], "allow-web");
    assert_eq!(
        nsg_args["securityRules"][0]["destinationApplicationSecurityGroupIds"],
        json!(["web-servers_id"])
    );

    // The virtual network owns exactly the one subnet, bound to the group.
    let vnet = engine.find(ResourceKind::VirtualNetwork, "vnet1").unwrap();
    let vnet_args = vnet.args.resolve().await.unwrap();
    assert_eq!(
        vnet_args["subnets"],
        json!([{
            "name": "subnet-00",
            "addressPrefix": "10.0.10.0/24",
            "securityGroup": "default_id"
        }])
    );
    assert_eq!(vnet_args["addressSpaces"], json!(["10.0.0.0/16"]));
    assert_eq!(vnet_args["location"], "uswest");
    assert_eq!(vnet_args["resourceGroupName"], "rg1");

    assert_eq!(report.resources.len(), 4);
    assert_eq!(report.resources[3].id, "vnet1_id");
    assert_eq!(report.project, "topo");
    assert_eq!(report.stack, "dev");
}

#[tokio::test]
async fn test_every_taggable_resource_is_tagged() {
    let engine = MockEngine::new("azure-topology", "prod");
    let deployment = Deployment::new(Arc::new(engine.clone()));
    deployment.run(&topology(&network_pairs())).await.unwrap();

    for declaration in engine.declarations() {
        let args = declaration.args.resolve().await.unwrap();
        assert_eq!(
            args["tags"],
            json!({"project": "azure-topology", "stack": "prod"}),
            "{} is not tagged",
            declaration.name
        );
    }
}

#[tokio::test]
async fn test_subnet_with_unknown_security_group_fails_before_networks() {
    let engine = MockEngine::default();
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let mut pairs = network_pairs();
    pairs[3] = (
        "subnets",
        r#"[{"name": "subnet-00", "addressPrefix": "10.0.10.0/24", "securityGroup": "missing-nsg"}]"#,
    );

    let err = deployment.run(&topology(&pairs)).await.unwrap_err();
    match err {
        CoreError::MissingReference { name, kind } => {
            assert_eq!(name, "missing-nsg");
            assert_eq!(kind, ReferenceKind::NetworkSecurityGroup);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(engine.names_of(ResourceKind::VirtualNetwork).is_empty());
    assert!(engine.was_declared(ResourceKind::NetworkSecurityGroup, "default"));
}

#[tokio::test]
async fn test_virtual_network_with_unknown_subnet() {
    let engine = MockEngine::default();
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let mut pairs = network_pairs();
    pairs[4] = (
        "virtualNetworks",
        r#"[{"name": "vnet1", "cidr": "10.0.0.0/16", "subnets": ["subnet-00", "subnet-01"]}]"#,
    );

    let err = deployment.run(&topology(&pairs)).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::MissingReference { ref name, kind: ReferenceKind::Subnet } if name == "subnet-01"
    ));
    assert!(!engine.was_declared(ResourceKind::VirtualNetwork, "vnet1"));
}

#[tokio::test]
async fn test_rule_with_unknown_app_security_group() {
    let engine = MockEngine::default();
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let mut pairs = network_pairs();
    pairs[0] = ("appSecurityGroups", r#"[{"name": "admin-servers"}]"#);

    let err = deployment.run(&topology(&pairs)).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::MissingReference { ref name, kind: ReferenceKind::ApplicationSecurityGroup }
            if name == "web-servers"
    ));
    assert_eq!(engine.names_of(ResourceKind::NetworkSecurityGroup), Vec::<String>::new());
}

#[tokio::test]
async fn test_virtual_machines_expand_into_instances() {
    let engine = MockEngine::new("topo", "dev");
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let mut pairs = network_pairs();
    pairs.extend(compute_pairs(WEB_VMS));
    let report = deployment.run(&topology(&pairs)).await.unwrap();

    assert_eq!(
        engine.names_of(ResourceKind::VirtualMachine),
        vec!["web-0", "web-1", "web-2"]
    );
    assert_eq!(
        engine.names_of(ResourceKind::NetworkInterface),
        vec!["web-0-primary", "web-1-primary", "web-2-primary"]
    );
    assert_eq!(
        engine.names_of(ResourceKind::NetworkInterfaceSecurityGroupAssociation),
        vec![
            "web-0-appsec-association",
            "web-1-appsec-association",
            "web-2-appsec-association"
        ]
    );

    // NIC, association and VM are declared together per instance.
    let per_instance: Vec<_> = report
        .declared()
        .skip_while(|s| s.name != "web-0-primary")
        .take(3)
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(per_instance, vec!["web-0-primary", "web-0-appsec-association", "web-0"]);

    let nic = engine
        .find(ResourceKind::NetworkInterface, "web-1-primary")
        .unwrap();
    let nic_args = nic.args.resolve().await.unwrap();
    assert_eq!(
        nic_args["ipConfigurations"][0],
        json!({
            "name": "web-1-primary-ipconfig",
            "primary": true,
            "privateIpAddressAllocation": "Dynamic",
            "privateIpAddressVersion": "IPv4",
            "subnetId": "vnet1_id/subnets/subnet-00"
        })
    );

    let vm = engine.find(ResourceKind::VirtualMachine, "web-2").unwrap();
    let vm_args = vm.args.resolve().await.unwrap();
    assert_eq!(vm_args["primaryNetworkInterfaceId"], "web-2-primary_id");
    assert_eq!(vm_args["networkInterfaceIds"], json!(["web-2-primary_id"]));
    assert_eq!(vm_args["osProfile"]["computerName"], "web-2");
    assert_eq!(vm_args["osProfile"]["customData"], "apt install -y ntpd");
    assert_eq!(vm_args["storageOsDisk"]["name"], "web-2");
    assert_eq!(vm_args["storageOsDisk"]["diskSizeGb"], 30);
    assert_eq!(vm_args["storageImageReference"]["sku"], "16.04-LTS");
    assert_eq!(vm_args["osProfileLinuxConfig"]["disablePasswordAuthentication"], false);
    assert!(vm_args.get("availabilitySetId").is_none());
}

#[tokio::test]
async fn test_round_robin_without_named_subnet() {
    let engine = MockEngine::default();
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let mut pairs = network_pairs();
    pairs[3] = (
        "subnets",
        r#"[
            {"name": "subnet-00", "addressPrefix": "10.0.10.0/24"},
            {"name": "subnet-01", "addressPrefix": "10.0.11.0/24"}
        ]"#,
    );
    pairs[4] = (
        "virtualNetworks",
        r#"[{"name": "vnet1", "cidr": "10.0.0.0/16", "subnets": ["subnet-00", "subnet-01"]}]"#,
    );
    pairs.extend(compute_pairs(
        r#"[{
            "name": "app",
            "count": 3,
            "osProfile": "default",
            "storageImageReference": "ubuntu-16.04",
            "storageOSDisk": "default",
            "virtualNetwork": "vnet1",
            "vmSize": "Standard_B1ls"
        }]"#,
    ));
    deployment.run(&topology(&pairs)).await.unwrap();

    let mut placed = Vec::new();
    for name in ["app-0-primary", "app-1-primary", "app-2-primary"] {
        let nic = engine.find(ResourceKind::NetworkInterface, name).unwrap();
        let args = nic.args.resolve().await.unwrap();
        placed.push(args["ipConfigurations"][0]["subnetId"].clone());
    }
    assert_eq!(
        placed,
        vec![
            Value::from("vnet1_id/subnets/subnet-00"),
            Value::from("vnet1_id/subnets/subnet-01"),
            Value::from("vnet1_id/subnets/subnet-00"),
        ]
    );
    assert!(engine
        .names_of(ResourceKind::NetworkInterfaceSecurityGroupAssociation)
        .is_empty());
}

#[tokio::test]
async fn test_missing_os_profile_declares_no_instance() {
    let engine = MockEngine::default();
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let mut pairs = network_pairs();
    pairs.extend(compute_pairs(
        r#"[{
            "name": "web",
            "count": 2,
            "osProfile": "hardened",
            "storageImageReference": "ubuntu-16.04",
            "storageOSDisk": "default",
            "virtualNetwork": "vnet1",
            "vmSize": "Standard_B1ls"
        }]"#,
    ));

    let err = deployment.run(&topology(&pairs)).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::MissingReference { ref name, kind: ReferenceKind::OsProfile }
            if name == "hardened"
    ));
    assert!(engine.names_of(ResourceKind::NetworkInterface).is_empty());
    assert!(engine.names_of(ResourceKind::VirtualMachine).is_empty());
}

#[tokio::test]
async fn test_load_balancer_and_bastion() {
    let engine = MockEngine::new("topo", "dev");
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let mut pairs = network_pairs();
    pairs[3] = (
        "subnets",
        r#"[
            {"name": "subnet-00", "addressPrefix": "10.0.10.0/24", "securityGroup": "default"},
            {"name": "AzureBastionSubnet", "addressPrefix": "10.0.99.0/27"}
        ]"#,
    );
    pairs[4] = (
        "virtualNetworks",
        r#"[{"name": "vnet1", "cidr": "10.0.0.0/16", "subnets": ["subnet-00", "AzureBastionSubnet"]}]"#,
    );
    pairs.extend(compute_pairs(WEB_VMS));
    pairs.push((
        "publicIP",
        r#"[
            {"name": "web-ip", "allocationMethod": "Static", "sku": "Standard"},
            {"name": "bastion-ip", "allocationMethod": "Static", "sku": "Standard"}
        ]"#,
    ));
    pairs.push((
        "loadBalancers",
        r#"[{
            "name": "web-lb",
            "publicIP": "web-ip",
            "virtualNetwork": "vnet1",
            "subnet": "subnet-00",
            "frontendPort": 80,
            "backendPort": 8080,
            "backendHosts": ["web"],
            "protocol": "Tcp",
            "probePort": 8080,
            "probeProtocol": "Http",
            "probeRequestPath": "/healthz",
            "sku": "Standard"
        }]"#,
    ));
    pairs.push((
        "bastionHosts",
        r#"[{"name": "bastion", "publicIP": "bastion-ip", "virtualNetwork": "vnet1"}]"#,
    ));

    let report = deployment.run(&topology(&pairs)).await.unwrap();

    let tail: Vec<_> = engine
        .declared()
        .into_iter()
        .skip_while(|(kind, _)| *kind != ResourceKind::PublicIp)
        .collect();
    assert_eq!(
        tail,
        vec![
            (ResourceKind::PublicIp, "web-ip".to_string()),
            (ResourceKind::PublicIp, "bastion-ip".to_string()),
            (ResourceKind::LoadBalancer, "web-lb".to_string()),
            (ResourceKind::BackendAddressPool, "web-lb-backend-pool".to_string()),
            (ResourceKind::Probe, "web-lb-probe-web".to_string()),
            (ResourceKind::LoadBalancerRule, "web-lb-rule-web".to_string()),
            (
                ResourceKind::NetworkInterfacePoolAssociation,
                "web-lb-backend-network-interface-web-0".to_string()
            ),
            (
                ResourceKind::NetworkInterfacePoolAssociation,
                "web-lb-backend-network-interface-web-1".to_string()
            ),
            (
                ResourceKind::NetworkInterfacePoolAssociation,
                "web-lb-backend-network-interface-web-2".to_string()
            ),
            (ResourceKind::BastionHost, "bastion".to_string()),
        ]
    );

    let lb = engine.find(ResourceKind::LoadBalancer, "web-lb").unwrap();
    let lb_args = lb.args.resolve().await.unwrap();
    assert_eq!(
        lb_args["frontendIpConfigurations"],
        json!([{"name": "web-lb-frontend-config", "publicIpAddressId": "web-ip_id"}])
    );

    let rule = engine
        .find(ResourceKind::LoadBalancerRule, "web-lb-rule-web")
        .unwrap();
    let rule_args = rule.args.resolve().await.unwrap();
    assert_eq!(rule_args["backendAddressPoolId"], "web-lb-backend-pool_id");
    assert_eq!(rule_args["probeId"], "web-lb-probe-web_id");
    assert_eq!(rule_args["frontendIpConfigurationName"], "web-lb-frontend-config");
    assert_eq!(rule_args["backendPort"], 8080);
    assert!(rule_args.get("tags").is_none());

    let member = engine
        .find(
            ResourceKind::NetworkInterfacePoolAssociation,
            "web-lb-backend-network-interface-web-1",
        )
        .unwrap();
    let member_args = member.args.resolve().await.unwrap();
    assert_eq!(member_args["networkInterfaceId"], "web-1-primary_id");
    assert_eq!(member_args["ipConfigurationName"], "web-1-primary-ipconfig");

    let bastion = engine.find(ResourceKind::BastionHost, "bastion").unwrap();
    let bastion_args = bastion.args.resolve().await.unwrap();
    assert_eq!(
        bastion_args["ipConfiguration"],
        json!({
            "name": "bastion",
            "publicIpAddressId": "bastion-ip_id",
            "subnetId": "vnet1_id/subnets/AzureBastionSubnet"
        })
    );

    assert_eq!(report.resources.len(), engine.declaration_count());
}

#[tokio::test]
async fn test_load_balancer_without_hosts_uses_dedicated_interface() {
    let engine = MockEngine::default();
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let mut pairs = network_pairs();
    pairs.push(("publicIP", r#"[{"name": "web-ip", "allocationMethod": "Static"}]"#));
    pairs.push((
        "loadBalancers",
        r#"[{
            "name": "web-lb",
            "publicIP": "web-ip",
            "virtualNetwork": "vnet1",
            "subnet": "subnet",
            "frontendPort": 80,
            "backendPort": 80,
            "protocol": "Tcp",
            "probePort": 80,
            "probeProtocol": "Tcp"
        }]"#,
    ));

    deployment.run(&topology(&pairs)).await.unwrap();

    let nic = engine
        .find(ResourceKind::NetworkInterface, "web-lb-netinf")
        .unwrap();
    let nic_args = nic.args.resolve().await.unwrap();
    assert_eq!(
        nic_args["ipConfigurations"][0]["subnetId"],
        "vnet1_id/subnets/subnet-00"
    );

    let association = engine
        .find(
            ResourceKind::NetworkInterfacePoolAssociation,
            "web-lb-backend-network-interface",
        )
        .unwrap();
    let association_args = association.args.resolve().await.unwrap();
    assert_eq!(association_args["networkInterfaceId"], "web-lb-netinf_id");
    assert_eq!(association_args["ipConfigurationName"], "web-lb-netinf");
}

#[tokio::test]
async fn test_bastion_requires_bastion_subnet() {
    let engine = MockEngine::default();
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let mut pairs = network_pairs();
    pairs.push(("publicIP", r#"[{"name": "bastion-ip", "allocationMethod": "Static"}]"#));
    pairs.push((
        "bastionHosts",
        r#"[{"name": "bastion", "publicIP": "bastion-ip", "virtualNetwork": "vnet1"}]"#,
    ));

    let err = deployment.run(&topology(&pairs)).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::MissingReference { ref name, kind: ReferenceKind::Subnet }
            if name == "AzureBastionSubnet"
    ));
    assert!(!engine.was_declared(ResourceKind::BastionHost, "bastion"));
}

#[tokio::test]
async fn test_provider_error_aborts_run() {
    let engine = MockEngine::default().fail_on("default", "quota exceeded");
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let err = deployment.run(&topology(&network_pairs())).await.unwrap_err();
    match err {
        CoreError::Engine(EngineError::DeclareFailed { name, message, .. }) => {
            assert_eq!(name, "default");
            assert_eq!(message, "quota exceeded");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(engine.declaration_count(), 2);
    assert!(engine.names_of(ResourceKind::VirtualNetwork).is_empty());
}

#[tokio::test]
async fn test_deferred_provider_error_fails_on_settle() {
    let engine = MockEngine::default().fail_outputs_of("web-servers", "conflict");
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let err = deployment.run(&topology(&network_pairs())).await.unwrap_err();
    assert!(matches!(err, CoreError::Output(_)));
    assert!(err.to_string().contains("conflict"));
    // Every declaration was issued before the failure surfaced.
    assert!(engine.was_declared(ResourceKind::VirtualNetwork, "vnet1"));
}

fn assert_missing(err: CoreError, name: &str, kind: ReferenceKind) {
    match err {
        CoreError::MissingReference {
            name: missing,
            kind: missing_kind,
        } => {
            assert_eq!(missing, name);
            assert_eq!(missing_kind, kind);
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// `WEB_VMS` with one reference replaced.
fn web_vms_with(field: &str, value: &str) -> String {
    let mut vms: Value = serde_json::from_str(WEB_VMS).unwrap();
    vms[0][field] = Value::from(value);
    vms.to_string()
}

async fn run_with_unknown_vm_reference(field: &str, value: &str, kind: ReferenceKind) {
    let engine = MockEngine::default();
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let vms = web_vms_with(field, value);
    let mut pairs: Vec<(&str, &str)> = network_pairs();
    pairs.extend(compute_pairs(&vms));

    let err = deployment.run(&topology(&pairs)).await.unwrap_err();
    assert_missing(err, value, kind);
    assert!(engine.names_of(ResourceKind::NetworkInterface).is_empty());
    assert!(engine.names_of(ResourceKind::VirtualMachine).is_empty());
}

#[tokio::test]
async fn test_virtual_machine_with_unknown_virtual_network() {
    run_with_unknown_vm_reference("virtualNetwork", "vnet9", ReferenceKind::VirtualNetwork).await;
}

#[tokio::test]
async fn test_virtual_machine_with_unknown_availability_set() {
    run_with_unknown_vm_reference("availabilitySet", "ha-set", ReferenceKind::AvailabilitySet)
        .await;
}

#[tokio::test]
async fn test_virtual_machine_with_unknown_image() {
    run_with_unknown_vm_reference(
        "storageImageReference",
        "centos-7",
        ReferenceKind::StorageImageReference,
    )
    .await;
}

#[tokio::test]
async fn test_virtual_machine_with_unknown_os_disk() {
    run_with_unknown_vm_reference("storageOSDisk", "premium", ReferenceKind::StorageOsDisk).await;
}

fn load_balancer(public_ip: &str, virtual_network: &str) -> String {
    format!(
        r#"[{{
            "name": "web-lb",
            "publicIP": "{}",
            "virtualNetwork": "{}",
            "subnet": "subnet-00",
            "frontendPort": 80,
            "backendPort": 80,
            "protocol": "Tcp",
            "probePort": 80,
            "probeProtocol": "Tcp"
        }}]"#,
        public_ip, virtual_network
    )
}

fn bastion_host(public_ip: &str, virtual_network: &str) -> String {
    format!(
        r#"[{{"name": "bastion", "publicIP": "{}", "virtualNetwork": "{}"}}]"#,
        public_ip, virtual_network
    )
}

const PUBLIC_IPS: &str = r#"[{"name": "web-ip", "allocationMethod": "Static"}]"#;

#[tokio::test]
async fn test_load_balancer_with_unknown_public_ip() {
    let engine = MockEngine::default();
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let balancers = load_balancer("nope", "vnet1");
    let mut pairs: Vec<(&str, &str)> = network_pairs();
    pairs.push(("publicIP", PUBLIC_IPS));
    pairs.push(("loadBalancers", &balancers));

    let err = deployment.run(&topology(&pairs)).await.unwrap_err();
    assert_missing(err, "nope", ReferenceKind::PublicIp);
    assert!(engine.was_declared(ResourceKind::PublicIp, "web-ip"));
    assert!(engine.names_of(ResourceKind::LoadBalancer).is_empty());
}

#[tokio::test]
async fn test_load_balancer_with_unknown_virtual_network() {
    let engine = MockEngine::default();
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let balancers = load_balancer("web-ip", "vnet9");
    let mut pairs: Vec<(&str, &str)> = network_pairs();
    pairs.push(("publicIP", PUBLIC_IPS));
    pairs.push(("loadBalancers", &balancers));

    let err = deployment.run(&topology(&pairs)).await.unwrap_err();
    assert_missing(err, "vnet9", ReferenceKind::VirtualNetwork);
    assert!(engine.names_of(ResourceKind::LoadBalancer).is_empty());
    assert!(engine.names_of(ResourceKind::BackendAddressPool).is_empty());
}

#[tokio::test]
async fn test_bastion_with_unknown_public_ip() {
    let engine = MockEngine::default();
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let hosts = bastion_host("bastion-ip", "vnet1");
    let mut pairs: Vec<(&str, &str)> = network_pairs();
    pairs.push(("publicIP", PUBLIC_IPS));
    pairs.push(("bastionHosts", &hosts));

    let err = deployment.run(&topology(&pairs)).await.unwrap_err();
    assert_missing(err, "bastion-ip", ReferenceKind::PublicIp);
    assert!(engine.names_of(ResourceKind::BastionHost).is_empty());
}

#[tokio::test]
async fn test_bastion_with_unknown_virtual_network() {
    let engine = MockEngine::default();
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let hosts = bastion_host("web-ip", "vnet9");
    let mut pairs: Vec<(&str, &str)> = network_pairs();
    pairs.push(("publicIP", PUBLIC_IPS));
    pairs.push(("bastionHosts", &hosts));

    let err = deployment.run(&topology(&pairs)).await.unwrap_err();
    assert_missing(err, "vnet9", ReferenceKind::VirtualNetwork);
    assert!(engine.names_of(ResourceKind::BastionHost).is_empty());
}

/// Mock engine whose virtual networks report subnet entries of their own.
#[derive(Clone)]
struct ReportingEngine {
    inner: MockEngine,
    reported_subnets: Value,
}

#[async_trait]
impl ResourceEngine for ReportingEngine {
    fn project(&self) -> &str {
        self.inner.project()
    }

    fn stack(&self) -> &str {
        self.inner.stack()
    }

    async fn declare(
        &self,
        kind: ResourceKind,
        name: &str,
        args: ResourceArgs,
    ) -> EngineResult<ResourceHandle> {
        let handle = self.inner.declare(kind, name, args).await?;
        if kind != ResourceKind::VirtualNetwork {
            return Ok(handle);
        }

        let subnets = self.reported_subnets.clone();
        let state = handle.state().map(move |mut state| {
            state.insert("subnets".to_string(), subnets);
            state
        });
        Ok(ResourceHandle::new(
            kind,
            handle.name.clone(),
            handle.urn.clone(),
            handle.id(),
            state,
        ))
    }
}

fn round_robin_pairs() -> Vec<(&'static str, &'static str)> {
    let mut pairs = network_pairs();
    pairs[3] = (
        "subnets",
        r#"[
            {"name": "subnet-00", "addressPrefix": "10.0.10.0/24"},
            {"name": "subnet-01", "addressPrefix": "10.0.11.0/24"}
        ]"#,
    );
    pairs[4] = (
        "virtualNetworks",
        r#"[{"name": "vnet1", "cidr": "10.0.0.0/16", "subnets": ["subnet-00", "subnet-01"]}]"#,
    );
    pairs.extend(compute_pairs(
        r#"[{
            "name": "app",
            "count": 2,
            "osProfile": "default",
            "storageImageReference": "ubuntu-16.04",
            "storageOSDisk": "default",
            "virtualNetwork": "vnet1",
            "vmSize": "Standard_B1ls"
        }]"#,
    ));
    pairs
}

#[tokio::test]
async fn test_subnet_ids_reported_by_provider() {
    let engine = ReportingEngine {
        inner: MockEngine::default(),
        reported_subnets: json!([
            {"name": "subnet-00", "id": "/real/subnet-00"},
            {"name": "subnet-01", "id": "/real/subnet-01"}
        ]),
    };
    let deployment = Deployment::new(Arc::new(engine.clone()));
    deployment.run(&topology(&round_robin_pairs())).await.unwrap();

    let mut placed = Vec::new();
    for name in ["app-0-primary", "app-1-primary"] {
        let nic = engine
            .inner
            .find(ResourceKind::NetworkInterface, name)
            .unwrap();
        let args = nic.args.resolve().await.unwrap();
        placed.push(args["ipConfigurations"][0]["subnetId"].clone());
    }
    assert_eq!(placed, vec![json!("/real/subnet-00"), json!("/real/subnet-01")]);
}

#[tokio::test]
async fn test_subnet_missing_from_provider_state_fails_on_settle() {
    let engine = ReportingEngine {
        inner: MockEngine::default(),
        reported_subnets: json!([{"name": "subnet-00", "id": "/real/subnet-00"}]),
    };
    let deployment = Deployment::new(Arc::new(engine.clone()));

    let err = deployment
        .run(&topology(&round_robin_pairs()))
        .await
        .unwrap_err();
    assert_missing(err, "subnet-01", ReferenceKind::Subnet);

    // Both instances were declared; the failure only surfaced once ids settled.
    assert_eq!(
        engine.inner.names_of(ResourceKind::VirtualMachine),
        vec!["app-0", "app-1"]
    );
}
